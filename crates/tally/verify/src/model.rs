//! Contract models.
//!
//! A model is the Rust rendering of an annotated contract: typed state `S`,
//! a constructor, public entry points, and the specifications the verifier
//! checks after every transaction.

use std::fmt;

use serde::{Deserialize, Serialize};
use tally_ledger::{EffectKind, Ledger};
use tally_types::{Address, Amount, Resource, ResourceDecl};

use crate::error::Abort;
use crate::exec::Execution;
use crate::value::{Args, Param, ParamKind};

/// Everything observable about a deployed contract between transactions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snapshot<S> {
    pub state: S,
    pub ledger: Ledger,
    /// Wei held by the contract.
    pub balance: Amount,
    pub destroyed: bool,
}

impl<S> Snapshot<S> {
    pub fn allocated(&self, resource: &Resource, holder: Address) -> Amount {
        self.ledger.allocated(resource, holder)
    }

    pub fn total(&self, resource: &Resource) -> Amount {
        self.ledger.total(resource)
    }
}

/// Transaction context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    pub sender: Address,
    pub value: Amount,
}

/// A completed transaction, as seen by specifications.
///
/// For the constructor `old` and `new` are the same snapshot.
pub struct Transition<'a, S> {
    pub old: &'a Snapshot<S>,
    pub new: &'a Snapshot<S>,
    pub msg: Msg,
    pub args: &'a Args,
    pub function: &'a str,
}

type Predicate<S> = Box<dyn Fn(&Transition<'_, S>) -> bool>;

/// An invariant, postcondition or check.
pub struct Spec<S> {
    text: String,
    label: Option<String>,
    predicate: Predicate<S>,
}

impl<S: 'static> Spec<S> {
    pub fn new(text: impl Into<String>, predicate: impl Fn(&Transition<'_, S>) -> bool + 'static) -> Self {
        Self {
            text: text.into(),
            label: None,
            predicate: Box::new(predicate),
        }
    }

    /// `sum(allocated[resource]) == self.<field>`
    pub fn conserves(resource: Resource, field: &str, value: fn(&S) -> Amount) -> Self {
        let text = format!("sum(allocated[{}]()) == self.{}", resource, field);
        Self::new(text, move |t| t.new.total(&resource) == value(&t.new.state))
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl<S> Spec<S> {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label_name(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn holds(&self, transition: &Transition<'_, S>) -> bool {
        (self.predicate)(transition)
    }
}

impl<S> fmt::Debug for Spec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spec")
            .field("text", &self.text)
            .field("label", &self.label)
            .finish()
    }
}

/// One entry of a `performs` clause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performs {
    pub kind: EffectKind,
    /// `None` covers every resource.
    pub resource: Option<String>,
}

impl Performs {
    pub fn new(kind: EffectKind, resource: impl Into<String>) -> Self {
        Self {
            kind,
            resource: Some(resource.into()),
        }
    }

    pub fn any(kind: EffectKind) -> Self {
        Self {
            kind,
            resource: None,
        }
    }

    pub fn covers(&self, kind: EffectKind, resource: &str) -> bool {
        self.kind == kind && self.resource.as_deref().map_or(true, |r| r == resource)
    }
}

impl fmt::Display for Performs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Some(resource) => write!(f, "{}[{}]", self.kind, resource),
            None => write!(f, "{}", self.kind),
        }
    }
}

type Body<S> = Box<dyn Fn(&mut S, &mut Execution<'_>, &Args) -> Result<(), Abort>>;
type Init<S> = Box<dyn Fn(&mut Execution<'_>, &Args) -> Result<S, Abort>>;

/// A public function.
pub struct EntryPoint<S> {
    name: String,
    params: Vec<Param>,
    payable: bool,
    performs: Option<Vec<Performs>>,
    postconditions: Vec<Spec<S>>,
    body: Body<S>,
}

impl<S: 'static> EntryPoint<S> {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&mut S, &mut Execution<'_>, &Args) -> Result<(), Abort> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            payable: false,
            performs: None,
            postconditions: Vec::new(),
            body: Box::new(body),
        }
    }

    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn payable(mut self) -> Self {
        self.payable = true;
        self
    }

    /// Declare an effect. The first call turns the clause on: from then on
    /// undeclared effects fail.
    pub fn performs(mut self, performs: Performs) -> Self {
        self.performs.get_or_insert_with(Vec::new).push(performs);
        self
    }

    pub fn ensures(mut self, spec: Spec<S>) -> Self {
        self.postconditions.push(spec);
        self
    }
}

impl<S> EntryPoint<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_payable(&self) -> bool {
        self.payable
    }

    pub fn performs_clause(&self) -> Option<&[Performs]> {
        self.performs.as_deref()
    }

    pub fn postconditions(&self) -> &[Spec<S>] {
        &self.postconditions
    }

    pub(crate) fn call(&self, state: &mut S, exec: &mut Execution<'_>, args: &Args) -> Result<(), Abort> {
        (self.body)(state, exec, args)
    }
}

/// `__init__`
pub struct Constructor<S> {
    params: Vec<Param>,
    payable: bool,
    init: Init<S>,
}

impl<S: 'static> Constructor<S> {
    pub fn new(init: impl Fn(&mut Execution<'_>, &Args) -> Result<S, Abort> + 'static) -> Self {
        Self {
            params: Vec::new(),
            payable: false,
            init: Box::new(init),
        }
    }

    /// Constructor that just builds the initial state.
    pub fn with_state(state: S) -> Self
    where
        S: Clone,
    {
        Self::new(move |_, _| Ok(state.clone()))
    }

    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn payable(mut self) -> Self {
        self.payable = true;
        self
    }
}

impl<S> Constructor<S> {
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_payable(&self) -> bool {
        self.payable
    }

    pub(crate) fn call(&self, exec: &mut Execution<'_>, args: &Args) -> Result<S, Abort> {
        (self.init)(exec, args)
    }
}

/// A derived resource and the contract holding that backs it.
pub struct DerivedResource<S> {
    pub resource: String,
    /// `Interface.resource` the derived resource wraps.
    pub underlying: String,
    pub label: Option<String>,
    holding: Box<dyn Fn(&Snapshot<S>) -> Amount>,
}

impl<S> DerivedResource<S> {
    /// The contract's current holding of the underlying resource.
    pub fn holding(&self, snapshot: &Snapshot<S>) -> Amount {
        (self.holding)(snapshot)
    }
}

/// A complete contract model.
pub struct Contract<S> {
    name: String,
    resources: Vec<ResourceDecl>,
    derived: Vec<DerivedResource<S>>,
    constructor: Constructor<S>,
    functions: Vec<EntryPoint<S>>,
    invariants: Vec<Spec<S>>,
    postconditions: Vec<Spec<S>>,
    checks: Vec<Spec<S>>,
}

impl<S: 'static> Contract<S> {
    pub fn new(name: impl Into<String>, constructor: Constructor<S>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            derived: Vec::new(),
            constructor,
            functions: Vec::new(),
            invariants: Vec::new(),
            postconditions: Vec::new(),
            checks: Vec::new(),
        }
    }

    /// `#@ resource: name(params)`
    pub fn resource(mut self, decl: ResourceDecl) -> Self {
        self.resources.push(decl);
        self
    }

    /// `#@ derived resource: name() -> underlying`
    ///
    /// `holding` computes the contract's holding of the underlying
    /// resource, which the derived resource's total must always equal.
    pub fn derived_resource(
        mut self,
        name: impl Into<String>,
        underlying: impl Into<String>,
        label: Option<&str>,
        holding: impl Fn(&Snapshot<S>) -> Amount + 'static,
    ) -> Self {
        let name = name.into();
        let underlying = underlying.into();
        self.resources
            .push(ResourceDecl::derived(name.clone(), underlying.clone()));
        self.derived.push(DerivedResource {
            resource: name,
            underlying,
            label: label.map(str::to_string),
            holding: Box::new(holding),
        });
        self
    }

    pub fn function(mut self, function: EntryPoint<S>) -> Self {
        self.functions.push(function);
        self
    }

    pub fn invariant(mut self, spec: Spec<S>) -> Self {
        self.invariants.push(spec);
        self
    }

    /// General postcondition, checked after every function.
    pub fn postcondition(mut self, spec: Spec<S>) -> Self {
        self.postconditions.push(spec);
        self
    }

    pub fn check(mut self, spec: Spec<S>) -> Self {
        self.checks.push(spec);
        self
    }
}

impl<S> Contract<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resources(&self) -> &[ResourceDecl] {
        &self.resources
    }

    pub fn derived(&self) -> &[DerivedResource<S>] {
        &self.derived
    }

    /// Names of the derived resources.
    pub fn derived_names(&self) -> Vec<String> {
        self.derived.iter().map(|d| d.resource.clone()).collect()
    }

    pub fn constructor(&self) -> &Constructor<S> {
        &self.constructor
    }

    pub fn functions(&self) -> &[EntryPoint<S>] {
        &self.functions
    }

    pub fn invariants(&self) -> &[Spec<S>] {
        &self.invariants
    }

    pub fn postconditions(&self) -> &[Spec<S>] {
        &self.postconditions
    }

    pub fn checks(&self) -> &[Spec<S>] {
        &self.checks
    }

    pub fn is_declared(&self, resource: &str) -> bool {
        resource == tally_types::WEI || self.resources.iter().any(|r| r.name == resource)
    }
}
