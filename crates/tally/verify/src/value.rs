use serde::{Deserialize, Serialize};
use tally_types::{Address, Amount};

use crate::config::Bounds;
use crate::error::Abort;

/// Parameter types the verifier can enumerate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// `uint256`
    Uint,
    /// `int128`
    Int,
    Address,
    Bool,
}

impl ParamKind {
    /// Every value of this type inside the bounds, in ascending order.
    pub fn domain(&self, bounds: &Bounds) -> Vec<Value> {
        match self {
            ParamKind::Uint => (0..=bounds.max_value).map(Value::Uint).collect(),
            ParamKind::Int => {
                let max = bounds.max_value.min(i128::MAX as u128) as i128;
                (-max..=max).map(Value::Int).collect()
            }
            ParamKind::Address => bounds
                .address_universe()
                .into_iter()
                .map(Value::Address)
                .collect(),
            ParamKind::Bool => vec![Value::Bool(false), Value::Bool(true)],
        }
    }
}

/// A function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

/// A concrete argument value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Uint(u128),
    Int(i128),
    Address(Address),
    Bool(bool),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Uint(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Address(a) => write!(f, "{}", a),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Arguments of one call, in parameter order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn uint(&self, index: usize) -> Result<u128, Abort> {
        match self.get(index)? {
            Value::Uint(v) => Ok(v),
            other => Err(mismatch(index, "uint256", other)),
        }
    }

    pub fn amount(&self, index: usize) -> Result<Amount, Abort> {
        self.uint(index).map(Amount)
    }

    pub fn int(&self, index: usize) -> Result<i128, Abort> {
        match self.get(index)? {
            Value::Int(v) => Ok(v),
            other => Err(mismatch(index, "int128", other)),
        }
    }

    pub fn address(&self, index: usize) -> Result<Address, Abort> {
        match self.get(index)? {
            Value::Address(a) => Ok(a),
            other => Err(mismatch(index, "address", other)),
        }
    }

    pub fn boolean(&self, index: usize) -> Result<bool, Abort> {
        match self.get(index)? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(index, "bool", other)),
        }
    }

    fn get(&self, index: usize) -> Result<Value, Abort> {
        self.0
            .get(index)
            .copied()
            .ok_or_else(|| Abort::Malformed(format!("no argument at position {}", index)))
    }

    /// Every argument vector for `params` inside the bounds.
    pub fn enumerate(params: &[Param], bounds: &Bounds) -> Vec<Args> {
        let mut combinations = vec![Vec::new()];
        for param in params {
            let domain = param.kind.domain(bounds);
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    domain.iter().map(move |value| {
                        let mut next = prefix.clone();
                        next.push(*value);
                        next
                    })
                })
                .collect();
        }
        combinations.into_iter().map(Args).collect()
    }
}

impl std::fmt::Display for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

fn mismatch(index: usize, expected: &str, found: Value) -> Abort {
    Abort::Malformed(format!(
        "argument {} is not a {}: found {}",
        index, expected, found
    ))
}
