use petrosaft::parameter::{Parameter, PureRecord};
use petrosaft::pcsaft::{PcSaft, PcSaftParameters, PcSaftRecord};
use std::error::Error;
use std::fs;
use std::sync::Arc;

mod c7plus;
mod density;
mod properties;
mod stability_analysis;
mod tp_flash;

/// Read the records of the given components (in that order) from the test parameter file.
pub fn read_records(components: &[&str]) -> Result<Vec<PureRecord<PcSaftRecord>>, Box<dyn Error>> {
    let file = fs::read_to_string("tests/pcsaft/test_parameters.json")?;
    let records: Vec<PureRecord<PcSaftRecord>> = serde_json::from_str(&file)?;
    let records = components
        .iter()
        .map(|&c| {
            records
                .iter()
                .find(|r| r.identifier.name.as_deref() == Some(c))
                .cloned()
                .ok_or_else(|| format!("component {c} not found"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

pub fn read_params(components: &[&str]) -> Result<Arc<PcSaftParameters>, Box<dyn Error>> {
    Ok(Arc::new(PcSaftParameters::from_records(
        read_records(components)?,
        None,
    )?))
}

pub fn pcsaft(components: &[&str]) -> Result<Arc<PcSaft>, Box<dyn Error>> {
    Ok(Arc::new(PcSaft::new(read_params(components)?)?))
}
