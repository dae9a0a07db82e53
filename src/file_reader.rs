use crate::customer::{CustomerId, CustomerRecord};
use crate::error::AcsError;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

// Processes one record of the customer file.
//
// The expected layout is "id:class,arrival,service", so the first csv field
// carries both the id and the class.
//
// Arguments:
// * `record`: The csv record.
// * `line`: 1-based line number, used in error messages.
//
// Returns:
// The parsed `CustomerRecord`, or `AcsError::Parse` if any field is missing or not a
// non-negative integer.
fn process_record(record: &StringRecord, line: usize) -> Result<CustomerRecord, AcsError> {
    let parse_error = |reason: String| AcsError::Parse { line, reason };

    if record.len() != 3 {
        return Err(parse_error(format!(
            "expected \"id:class,arrival,service\", found {} fields",
            record.len()
        )));
    }

    let (id, class) = record[0]
        .split_once(':')
        .ok_or_else(|| parse_error(format!("missing ':' in \"{}\"", &record[0])))?;

    let id = id
        .trim()
        .parse::<CustomerId>()
        .map_err(|e| parse_error(format!("invalid id \"{}\": {}", id, e)))?;
    let class = class
        .trim()
        .parse::<usize>()
        .map_err(|e| parse_error(format!("invalid class \"{}\": {}", class, e)))?;
    let arrival = record[1]
        .parse::<u64>()
        .map_err(|e| parse_error(format!("invalid arrival time \"{}\": {}", &record[1], e)))?;
    let service = record[2]
        .parse::<u64>()
        .map_err(|e| parse_error(format!("invalid service time \"{}\": {}", &record[2], e)))?;

    Ok(CustomerRecord::new(id, class, arrival, service))
}

// Reads every customer from `reader` and validates them against the number of classes.
pub fn parse_customers<R: Read>(reader: R, classes: usize) -> Result<Vec<CustomerRecord>, AcsError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut customers = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);
        customers.push(process_record(&record, line)?);
    }

    validate_customers(&customers, classes)?;
    Ok(customers)
}

// Reads and validates the customer file at `file_path`.
pub fn read_customers(file_path: &Path, classes: usize) -> Result<Vec<CustomerRecord>, AcsError> {
    let file = std::fs::File::open(file_path)?;
    let customers = parse_customers(file, classes)?;
    log::debug!(
        "[FILE READER] {} customers read from {}",
        customers.len(),
        file_path.display()
    );
    Ok(customers)
}

// Rejects everything the tasks cannot handle. Must run before any task starts.
pub fn validate_customers(customers: &[CustomerRecord], classes: usize) -> Result<(), AcsError> {
    let mut ids = HashSet::new();
    for customer in customers {
        if !ids.insert(customer.id) {
            return Err(AcsError::DuplicateId(customer.id));
        }
        if customer.class >= classes {
            return Err(AcsError::InvalidClass {
                id: customer.id,
                class: customer.class,
                classes,
            });
        }
        if customer.service == 0 {
            return Err(AcsError::InvalidServiceTime(customer.id));
        }
    }
    Ok(())
}
