//! Raw input specifications and their resolution into concrete task inputs.
//!
//! A [`RawInput`] holds network-independent defaults and per-network overrides,
//! each of which may contain literal values or [`TaskRef`]s to other tasks'
//! outputs. Resolving it for a network merges the overrides of that network on
//! top of the defaults and replaces every reference with the address it points to.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
    str::FromStr,
    sync::Arc,
};

use alloy_primitives::{Address, U256};
use itertools::Itertools;

use crate::{errors::DeployError, network::Network, reference::TaskRef, task::TaskEnv};

/// A literal input value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Param {
    /// A boolean
    Bool(bool),
    /// An unsigned integer
    Uint(U256),
    /// A string
    Str(String),
    /// An address
    Address(Address),
    /// A list of values
    List(Vec<Param>),
}

impl Param {
    /// The name of the variant, used in error messages
    fn kind(&self) -> &'static str {
        match self {
            Param::Bool(_) => "bool",
            Param::Uint(_) => "uint",
            Param::Str(_) => "string",
            Param::Address(_) => "address",
            Param::List(_) => "list",
        }
    }
}

/// Formats the value so that it can be coerced into any compatible ABI type
impl Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Bool(b) => write!(f, "{b}"),
            Param::Uint(n) => write!(f, "{n}"),
            Param::Str(s) => write!(f, "{s}"),
            Param::Address(a) => write!(f, "{a}"),
            Param::List(items) => {
                let items = items.iter().map(|item| match item {
                    Param::Str(s) => format!("{s:?}"),
                    other => other.to_string(),
                });
                write!(f, "[{}]", items.format(","))
            }
        }
    }
}

impl From<bool> for Param {
    fn from(b: bool) -> Self {
        Param::Bool(b)
    }
}

impl From<u64> for Param {
    fn from(n: u64) -> Self {
        Param::Uint(U256::from(n))
    }
}

impl From<U256> for Param {
    fn from(n: U256) -> Self {
        Param::Uint(n)
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Str(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Str(s)
    }
}

impl From<Address> for Param {
    fn from(a: Address) -> Self {
        Param::Address(a)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(items: Vec<T>) -> Self {
        Param::List(items.into_iter().map(Into::into).collect())
    }
}

/// A value of a raw input specification
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// A literal value, used as is
    Literal(Param),
    /// A reference to another task's output
    Task(TaskRef),
    /// A list whose items may themselves be references
    List(Vec<RawValue>),
}

/// Implement `From<$ty> for RawValue` via the literal conversion of `$ty`
macro_rules! impl_literal_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RawValue {
                fn from(value: $ty) -> Self {
                    RawValue::Literal(value.into())
                }
            }
        )*
    };
}

impl_literal_from!(Param, bool, u64, U256, &str, String, Address);

impl From<TaskRef> for RawValue {
    fn from(reference: TaskRef) -> Self {
        RawValue::Task(reference)
    }
}

/// A key-value mapping of raw input values
pub type RawKeyValue = BTreeMap<String, RawValue>;

/// The input specification of a task: defaults shared by every network, plus
/// overrides that supersede the defaults on a single network
#[derive(Clone, Debug, Default)]
pub struct RawInput {
    /// Values used on every network unless overridden
    defaults: RawKeyValue,
    /// Per-network values, taking precedence over `defaults`
    overrides: BTreeMap<Network, RawKeyValue>,
    /// Keys that must be present after overrides are applied
    required: BTreeSet<String>,
}

impl RawInput {
    /// Create an empty input
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a network-independent value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Set a value that only applies on `network`
    pub fn with_override(
        mut self,
        network: Network,
        key: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        self.overrides
            .entry(network)
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Require `key` to be present, either as a default or as an override
    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.required.insert(key.into());
        self
    }

    /// The values that apply on `network`, before references are resolved
    pub fn for_network(&self, network: Network) -> RawKeyValue {
        let mut values = self.defaults.clone();
        if let Some(overrides) = self.overrides.get(&network) {
            values.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        values
    }

    /// Resolve into the concrete input of `task_id` on `network`
    pub fn resolve(
        &self,
        env: &Arc<TaskEnv>,
        task_id: &str,
        network: Network,
    ) -> Result<Input, DeployError> {
        let raw = self.for_network(network);

        if let Some(missing) = self.required.iter().find(|key| !raw.contains_key(*key)) {
            return Err(DeployError::invalid_input(
                task_id,
                missing,
                format!("required input missing on {network}"),
            ));
        }

        let values = raw
            .iter()
            .map(|(key, value)| Ok((key.clone(), resolve_value(env, network, key, value)?)))
            .collect::<Result<_, DeployError>>()?;

        Ok(Input {
            task: task_id.to_string(),
            values,
        })
    }
}

/// Resolve a single raw value, reading references under the field `key` by default
fn resolve_value(
    env: &Arc<TaskEnv>,
    network: Network,
    key: &str,
    value: &RawValue,
) -> Result<Param, DeployError> {
    match value {
        RawValue::Literal(param) => Ok(param.clone()),
        RawValue::Task(reference) => reference.resolve(env, network, key).map(Param::Address),
        RawValue::List(items) => items
            .iter()
            .map(|item| resolve_value(env, network, key, item))
            .collect::<Result<_, _>>()
            .map(Param::List),
    }
}

/// The concrete input of a task on a single network
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    /// The task the input belongs to
    task: String,
    /// The resolved values
    values: BTreeMap<String, Param>,
}

impl Input {
    /// Whether the input has a value for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over the resolved values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The value of `key`, failing with [`DeployError::InvalidInput`] if absent
    pub fn get(&self, key: &str) -> Result<&Param, DeployError> {
        self.values
            .get(key)
            .ok_or_else(|| DeployError::invalid_input(&self.task, key, "missing"))
    }

    /// The value of `key` as an address, parsing strings if necessary
    pub fn address(&self, key: &str) -> Result<Address, DeployError> {
        match self.get(key)? {
            Param::Address(a) => Ok(*a),
            Param::Str(s) => Address::from_str(s)
                .map_err(|e| DeployError::invalid_input(&self.task, key, e.to_string())),
            other => Err(self.mismatch(key, "address", other)),
        }
    }

    /// The value of `key` as an unsigned integer, parsing strings if necessary
    pub fn uint(&self, key: &str) -> Result<U256, DeployError> {
        match self.get(key)? {
            Param::Uint(n) => Ok(*n),
            Param::Str(s) => U256::from_str(s)
                .map_err(|e| DeployError::invalid_input(&self.task, key, e.to_string())),
            other => Err(self.mismatch(key, "uint", other)),
        }
    }

    /// The value of `key` as a `u64`
    pub fn u64(&self, key: &str) -> Result<u64, DeployError> {
        u64::try_from(self.uint(key)?)
            .map_err(|e| DeployError::invalid_input(&self.task, key, e.to_string()))
    }

    /// The value of `key` as a string
    pub fn string(&self, key: &str) -> Result<&str, DeployError> {
        match self.get(key)? {
            Param::Str(s) => Ok(s),
            other => Err(self.mismatch(key, "string", other)),
        }
    }

    /// The value of `key` as a boolean
    pub fn bool(&self, key: &str) -> Result<bool, DeployError> {
        match self.get(key)? {
            Param::Bool(b) => Ok(*b),
            other => Err(self.mismatch(key, "bool", other)),
        }
    }

    /// The error for an input of the wrong kind
    fn mismatch(&self, key: &str, expected: &str, found: &Param) -> DeployError {
        DeployError::invalid_input(
            &self.task,
            key,
            format!("expected {expected}, found {}", found.kind()),
        )
    }
}
