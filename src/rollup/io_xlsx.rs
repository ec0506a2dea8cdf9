use calamine::DataType;

use crate::rollup::{
    io_common::{make_default_id, make_record, text_cell_to_json},
    *,
};

pub fn read_excel_roster(path: String, cfs: &FileSource) -> BoothResult<Vec<VoterRecord>> {
    let default_id = make_default_id(&path);
    let wrange = get_range(&path, cfs)?;
    let header_row = cfs.header_row_index()?;

    let mut iter = wrange.rows().skip(header_row);
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu {})?
        .iter()
        .map(|c| match c {
            DataType::String(s) => s.trim().to_string(),
            DataType::Int(i) => i.to_string(),
            DataType::Float(f) => f.to_string(),
            _ => "".to_string(),
        })
        .collect();
    debug!("read_excel_roster: header: {:?}", header);

    let mut res: Vec<VoterRecord> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + header_row + 2;
        let mut cells: Vec<JSValue> = Vec::with_capacity(row.len());
        for cell in row.iter() {
            cells.push(read_cell(cell, lineno)?);
        }
        if cells.iter().all(|c| c.is_null()) {
            continue;
        }
        let mut record = make_record(&header, cells);
        if let Some(obj) = record.as_object_mut() {
            if !obj.contains_key("_id") {
                obj.insert("_id".to_string(), JSValue::String(default_id(lineno)));
            }
        }
        debug!("read_excel_roster: lineno: {} record: {:?}", lineno, record);
        res.push(VoterRecord(record));
    }
    Ok(res)
}

fn read_cell(cell: &DataType, lineno: usize) -> BoothResult<JSValue> {
    match cell {
        DataType::String(s) if s.trim().is_empty() => Ok(JSValue::Null),
        DataType::String(s) => Ok(text_cell_to_json(s)),
        DataType::Int(i) => Ok(JSValue::from(*i)),
        // Whole numbers (door numbers, ages) are stored as floats by Excel.
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(JSValue::from(*f as i64)),
        DataType::Float(f) => Ok(JSValue::from(*f)),
        DataType::Bool(b) => Ok(JSValue::Bool(*b)),
        DataType::Empty => Ok(JSValue::Null),
        _ => Err(BoothError::ExcelWrongCellType {
            lineno: lineno as u64,
            content: format!("{:?}", cell),
        }),
    }
}

fn get_range(path: &String, cfs: &FileSource) -> BoothResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.worksheet_name.clone();
    debug!(
        "read_excel_roster: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let p = path.clone();
    let mut workbook: Xlsx<_> =
        open_workbook(p).context(OpeningExcelSnafu { path: path.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path: path.clone() })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path: path.clone() })?;
        Ok(wrange)
    }
}
