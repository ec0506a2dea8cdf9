// Primitives for reading CSV rosters.

use std::fs::File;

use crate::rollup::{
    io_common::{make_default_id, make_record, text_cell_to_json},
    *,
};

pub fn read_csv_roster(path: String, cfs: &FileSource) -> BoothResult<Vec<VoterRecord>> {
    let default_id = make_default_id(&path);
    let (mut records, row_offset) = get_records(&path, cfs)?;

    let header: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu {})?
            .iter()
            .map(|s| s.trim().to_string())
            .collect(),
        None => {
            warn!("read_csv_roster: {:?} is empty", path);
            return Ok(vec![]);
        }
    };
    debug!("read_csv_roster: header: {:?}", header);

    let mut res: Vec<VoterRecord> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // 1-based, counting the header line.
        let lineno = idx + row_offset + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        if line.iter().all(|s| s.trim().is_empty()) {
            debug!("read_csv_roster: skipping blank line {}", lineno);
            continue;
        }
        let cells: Vec<JSValue> = line
            .iter()
            .map(|s| {
                if s.is_empty() {
                    JSValue::Null
                } else {
                    text_cell_to_json(s)
                }
            })
            .collect();
        let mut record = make_record(&header, cells);
        if let Some(obj) = record.as_object_mut() {
            if !obj.contains_key("_id") {
                obj.insert("_id".to_string(), JSValue::String(default_id(lineno)));
            }
        }
        debug!("read_csv_roster: lineno: {:?} record: {:?}", lineno, record);
        res.push(VoterRecord(record));
    }
    Ok(res)
}

fn get_records(
    path: &String,
    cfs: &FileSource,
) -> BoothResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let header_row = cfs.header_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path: path.clone() })?;
    let mut records = rdr.into_records();
    for _ in 0..header_row {
        _ = records.next();
    }
    Ok((records, header_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, contents: &str) -> String {
        let p = std::env::temp_dir().join(format!("boothroll-{}-{}", std::process::id(), name));
        let mut f = File::create(&p).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        p.display().to_string()
    }

    #[test]
    fn read_roster_with_title_row() {
        let path = write_tmp(
            "title.csv",
            "Booth 42 roster,,,,\nvoterID,Name,Door_No,Street,verified\nTN1,Ravi,12,Main,true\n,,,,\nTN2,Mala,12,Main,\n",
        );
        let mut cfs = FileSource::new("csv", &path);
        cfs._first_row_index = Some(JSValue::from(2));
        let voters = read_csv_roster(path.clone(), &cfs).unwrap();
        assert_eq!(voters.len(), 2);
        assert_eq!(voters[0].0["verified"], JSValue::Bool(true));
        assert_eq!(voters[1].0.get("verified"), None);
        assert!(voters[1].0["_id"].as_str().unwrap().ends_with("-00000005"));

        let res = rollup(&voters, &RollupRules::DEFAULT_RULES);
        assert_eq!(res.stats.total_families, 1);
        assert_eq!(res.stats.verified_voters, 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn empty_file() {
        let path = write_tmp("empty.csv", "");
        let voters = read_csv_roster(path.clone(), &FileSource::new("csv", &path)).unwrap();
        assert!(voters.is_empty());
        let _ = std::fs::remove_file(path);
    }
}
