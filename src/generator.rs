use crate::customer::CustomerRecord;
use crate::error::AcsError;
use csv::WriterBuilder;
use rand::Rng;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub customers: u32,
    pub classes: usize,
    pub min_arrival: u64,
    pub max_arrival: u64,
    pub min_service: u64,
    pub max_service: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            customers: 10,
            classes: 2,
            min_arrival: 1,
            max_arrival: 10,
            min_service: 1,
            max_service: 10,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> Result<(), AcsError> {
        if self.classes == 0 {
            return Err(AcsError::NoClasses);
        }
        if self.min_arrival > self.max_arrival {
            return Err(AcsError::InvalidRange {
                name: "arrival",
                min: self.min_arrival,
                max: self.max_arrival,
            });
        }
        if self.min_service > self.max_service {
            return Err(AcsError::InvalidRange {
                name: "service",
                min: self.min_service,
                max: self.max_service,
            });
        }
        Ok(())
    }
}

// Generates customers with ids 1..=n and uniformly drawn class and times.
// A minimum service of 0 is raised to 1 so the output always loads back.
pub fn generate<R: Rng>(config: &GeneratorConfig, rng: &mut R) -> Result<Vec<CustomerRecord>, AcsError> {
    config.validate()?;
    let min_service = config.min_service.max(1);
    let max_service = config.max_service.max(min_service);

    Ok((1..=config.customers)
        .map(|id| {
            CustomerRecord::new(
                id,
                rng.gen_range(0..config.classes),
                rng.gen_range(config.min_arrival..=config.max_arrival),
                rng.gen_range(min_service..=max_service),
            )
        })
        .collect())
}

// Writes customers in the format the file reader expects, one per line.
pub fn write_customers<W: Write>(customers: &[CustomerRecord], writer: W) -> Result<(), AcsError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    for customer in customers {
        wtr.write_record([
            format!("{}:{}", customer.id, customer.class),
            customer.arrival.to_string(),
            customer.service.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
