/*!

This is the long-form manual for `voter_households` and `boothroll`.

## Voter records

Voter records come from the backend as JSON objects. Over time, the same
information has been stored under different keys. The first key holding a
non-empty value is used:

| Field        | Keys, in order                                                     | Default     |
|--------------|--------------------------------------------------------------------|-------------|
| name         | `name.english`, `Name`, `name`                                     | `Unknown`   |
| age          | `age`, `Age` (integer prefix, e.g. `"42 yrs"` is 42; a zero `age` falls back to `Age`) | `0` |
| gender       | `gender`, `Gender`, `sex`                                          | other       |
| house number | `Address-House no`, `HouseNo`, `Door_No`, `Door_no`, `door_no`     | empty       |
| street       | `Address-Street`, `Street`, `Anubhag_name`, `address`              | empty       |
| mobile       | `mobile`, `Mobile`, `phone`                                        | none        |
| EPIC number  | `voterID`, `voterId`, `epic`, `EPIC_No`                            | none        |

A voter is verified when `verified` is `true` or `status` is `"verified"`, and
surveyed when `surveyed` is `true`.

## Households

- voters sharing a `familyId` form one household, whatever their address (the
  value is taken as is: `" F1 "` and `"F1"` are different families);
- the other voters are grouped by `<house number>-<street>`. These households
  get the id `address-family-<hash>`, where the hash only depends on the address,
  so the id does not change when the roster is reordered;
- voters with neither a family id nor an address are listed as *ungrouped*
  and counted in `ungroupedVoters`.

Members are sorted by age, oldest first. The oldest member is the head of the
family.

## Statistics

- `totalVoters`: the number of voters (or the total announced by the server);
- `totalFamilies`: the number of households;
- `verifiedVoters`, `surveysCompleted`;
- `visitsPending`: every voter should answer every active survey form once,
  so it is `totalVoters * activeSurveyForms - surveysCompleted` (at least 0);
- `maleVoters`, `femaleVoters`, `othersVoters`;
- `age60Plus` (60 to 79), `age80Plus` (80 and more).

## Input formats

The following roster formats are supported by `boothroll`:
* `json` a page of the voter endpoint (`{"success": .., "voters": [..], "pagination": {..}}`)
  or a bare array of voters
* `csv` comma separated values, first row is the header with the field names
* `xlsx` Excel spreadsheet, first row is the header with the field names

The survey list is a JSON file with the survey forms, either as a bare array or
under a `surveys` key. A form is active when `isActive` is `true` or `status`
is `"active"`.

## Configuration file

```json
{
  "outputSettings": {"boothName": "Booth 42", "assemblyName": "Mylapore"},
  "rosterSources": [{"provider": "csv", "filePath": "booth42.csv"}],
  "surveySource": {"filePath": "surveys.json"},
  "rules": {"activeSurveyForms": 2}
}
```

Paths are relative to the configuration file.

*/
