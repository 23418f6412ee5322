use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};

/// Parameter identifying a job run.
pub const RUN_ID_KEY: &str = "run.id";

/// A single job parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobParameter {
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
}

/// Immutable parameters of one job run.
///
/// Values given on a command line usually arrive as strings, so the typed
/// getters also accept a string holding the right literal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobParameters {
    parameters: BTreeMap<String, JobParameter>,
}

impl JobParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&JobParameter> {
        self.parameters.get(key)
    }

    /// Returns the parameter as an integer, parsing string values.
    ///
    /// `None` when missing; `Some(Err(raw))` when present but not an integer.
    pub fn get_long(&self, key: &str) -> Option<Result<i64, String>> {
        self.parameters.get(key).map(|parameter| match parameter {
            JobParameter::Long(value) => Ok(*value),
            JobParameter::String(raw) => raw.trim().parse::<i64>().map_err(|_| raw.clone()),
            other => Err(format!("{:?}", other)),
        })
    }

    /// Returns the parameter as a boolean, parsing `"true"`/`"false"`.
    pub fn get_bool(&self, key: &str) -> Option<Result<bool, String>> {
        self.parameters.get(key).map(|parameter| match parameter {
            JobParameter::Bool(value) => Ok(*value),
            JobParameter::String(raw) => raw.trim().parse::<bool>().map_err(|_| raw.clone()),
            other => Err(format!("{:?}", other)),
        })
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.parameters.get(key).map(|parameter| match parameter {
            JobParameter::String(value) => value.clone(),
            JobParameter::Long(value) => value.to_string(),
            JobParameter::Double(value) => value.to_string(),
            JobParameter::Bool(value) => value.to_string(),
        })
    }

    /// Run identity, if the `run.id` parameter is set to a positive integer.
    pub fn run_id(&self) -> Option<u64> {
        match self.get_long(RUN_ID_KEY) {
            Some(Ok(value)) if value > 0 => Some(value as u64),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, JobParameter> {
        self.parameters.iter()
    }
}

/// Builder for [`JobParameters`].
///
/// # Examples
///
/// ```
/// use spring_batch_example::core::parameters::JobParametersBuilder;
///
/// let parameters = JobParametersBuilder::new()
///     .add_string("chunkSize", "20")
///     .add_bool("allowDuplicate", true)
///     .build();
///
/// assert_eq!(parameters.get_long("chunkSize"), Some(Ok(20)));
/// assert_eq!(parameters.get_bool("allowDuplicate"), Some(Ok(true)));
/// ```
#[derive(Default)]
pub struct JobParametersBuilder {
    parameters: BTreeMap<String, JobParameter>,
}

impl JobParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a copy of existing parameters.
    pub fn from(parameters: &JobParameters) -> Self {
        Self {
            parameters: parameters.parameters.clone(),
        }
    }

    pub fn add_long(mut self, key: &str, value: i64) -> Self {
        self.parameters
            .insert(key.to_string(), JobParameter::Long(value));
        self
    }

    pub fn add_double(mut self, key: &str, value: f64) -> Self {
        self.parameters
            .insert(key.to_string(), JobParameter::Double(value));
        self
    }

    pub fn add_bool(mut self, key: &str, value: bool) -> Self {
        self.parameters
            .insert(key.to_string(), JobParameter::Bool(value));
        self
    }

    pub fn add_string(mut self, key: &str, value: &str) -> Self {
        self.parameters
            .insert(key.to_string(), JobParameter::String(value.to_string()));
        self
    }

    pub fn add_parameter(mut self, key: &str, value: JobParameter) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> JobParameters {
        JobParameters {
            parameters: self.parameters,
        }
    }
}

/// Computes the parameters of the next run from those of the previous one.
pub trait JobParametersIncrementer {
    fn next(&self, previous: Option<&JobParameters>) -> JobParameters;
}

/// Increments `run.id` so every launch creates a distinct job run.
///
/// Only `run.id` is carried over: the other parameters of the next run are
/// the ones it is launched with.
#[derive(Default, Debug, Clone, Copy)]
pub struct RunIdIncrementer;

impl JobParametersIncrementer for RunIdIncrementer {
    fn next(&self, previous: Option<&JobParameters>) -> JobParameters {
        let next_id = previous.and_then(JobParameters::run_id).unwrap_or(0) + 1;

        JobParametersBuilder::new()
            .add_long(RUN_ID_KEY, next_id as i64)
            .build()
    }
}
