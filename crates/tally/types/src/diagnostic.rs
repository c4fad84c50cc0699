//! Diagnostic vocabulary shared by verification runs and fixture oracles.
//!
//! A diagnostic is identified by `kind:reason`, e.g.
//! `invariant.violated:assertion.false`, and located by the function it was
//! raised in plus an optional source label.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, TypesError};

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $ty:ident / $err:ident {
            $($variant:ident => $id:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $ty {
            $($variant,)*
        }

        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $id,)*
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($id => Ok($ty::$variant),)*
                    other => Err(TypesError::$err(other.to_string())),
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = TypesError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for &'static str {
            fn from(value: $ty) -> Self {
                value.as_str()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// What failed.
    pub enum ErrorKind / UnknownErrorKind {
        AssignmentFailed => "assignment.failed",
        CallFailed => "call.failed",
        NotWellformed => "not.wellformed",
        CallInvariant => "call.invariant",
        CallCheck => "call.check",
        CallPrecondition => "call.precondition",
        CallLeakcheck => "call.leakcheck",
        ApplicationPrecondition => "application.precondition",
        ExhaleFailed => "exhale.failed",
        InhaleFailed => "inhale.failed",
        IfFailed => "if.failed",
        WhileFailed => "while.failed",
        AssertFailed => "assert.failed",
        PostconditionViolated => "postcondition.violated",
        PostconditionNotImplemented => "postcondition.not.implemented",
        InvariantViolated => "invariant.violated",
        CheckViolated => "check.violated",
        InvariantNotWellformed => "invariant.not.wellformed",
        PostconditionNotWellformed => "postcondition.not.wellformed",
        InterfacePostconditionNotWellformed => "interface.postcondition.not.wellformed",
        CreateFailed => "create.failed",
        DestroyFailed => "destroy.failed",
        ReallocateFailed => "reallocate.failed",
        ExchangeFailed => "exchange.failed",
        OfferFailed => "offer.failed",
        RevokeFailed => "revoke.failed",
        TrustFailed => "trust.failed",
        LeakcheckFailed => "leakcheck.failed",
        DerivedResourceInvariantFailed => "derived.resource.invariant.failed",
        FoldFailed => "fold.failed",
        UnfoldFailed => "unfold.failed",
        LoopInvariantNotPreserved => "invariant.not.preserved",
        LoopInvariantNotEstablished => "invariant.not.established",
        FunctionNotWellformed => "function.not.wellformed",
        PredicateNotWellformed => "predicate.not.wellformed",
    }
}

vocabulary! {
    /// Why it failed.
    pub enum Reason / UnknownReason {
        AssertionFalse => "assertion.false",
        TransitivityViolated => "transitivity.violated",
        ConstantBalance => "constant.balance",
        DivisionByZero => "division.by.zero",
        SeqIndexLength => "seq.index.length",
        SeqIndexNegative => "seq.index.negative",
        NotImplementsInterface => "not.implements.interface",
        InsufficientFunds => "insufficient.funds",
        NoOffer => "no.offer",
        NotACreator => "not.a.creator",
        NotTrusted => "not.trusted",
        OfferNotInjective => "offer.not.injective",
        NoPerforms => "no.performs",
        AllocationLeaked => "allocation.leaked",
        ReceiverNotInjective => "receiver.not.injective",
        ReceiverNull => "receiver.null",
        NegativePermission => "negative.permission",
        InsufficientPermission => "insufficient.permission",
    }
}

impl ErrorKind {
    /// Human-readable description of the failing construct.
    pub fn message(&self, function: &str, node: &str) -> String {
        match self {
            ErrorKind::AssignmentFailed => "Assignment might fail.".into(),
            ErrorKind::CallFailed => "Method call might fail.".into(),
            ErrorKind::NotWellformed => format!("Function {} might not be well-formed.", function),
            ErrorKind::CallInvariant => {
                format!("An invariant might not hold before the call {}.", node)
            }
            ErrorKind::CallCheck => format!("A check might not hold before the call {}.", node),
            ErrorKind::CallPrecondition | ErrorKind::ApplicationPrecondition => {
                format!("The precondition of function {} might not hold.", node)
            }
            ErrorKind::CallLeakcheck => {
                format!("The leak check for call {} might not hold.", node)
            }
            ErrorKind::ExhaleFailed => "Exhale might fail.".into(),
            ErrorKind::InhaleFailed => "Inhale might fail.".into(),
            ErrorKind::IfFailed => "Conditional statement might fail.".into(),
            ErrorKind::WhileFailed => "While statement might fail.".into(),
            ErrorKind::AssertFailed => "Assert might fail.".into(),
            ErrorKind::PostconditionViolated => {
                format!("Postcondition of {} might not hold.", function)
            }
            ErrorKind::PostconditionNotImplemented => format!(
                "Function {} might not correctly implement an interface.",
                function
            ),
            ErrorKind::InvariantViolated => format!("Invariant not preserved by {}.", function),
            ErrorKind::CheckViolated => format!(
                "A check might not hold after the body of {}.",
                function
            ),
            ErrorKind::InvariantNotWellformed => {
                format!("Invariant {} might not be well-formed.", node)
            }
            ErrorKind::PostconditionNotWellformed => {
                format!("General postcondition {} might not be well-formed.", node)
            }
            ErrorKind::InterfacePostconditionNotWellformed => {
                format!("Postcondition of {} might not be well-formed.", node)
            }
            ErrorKind::CreateFailed => format!("Create {} might fail.", node),
            ErrorKind::DestroyFailed => format!("Destroy {} might fail.", node),
            ErrorKind::ReallocateFailed => "Reallocate might fail.".into(),
            ErrorKind::ExchangeFailed => format!("Exchange {} might fail.", node),
            ErrorKind::OfferFailed => format!("Offer {} might fail.", node),
            ErrorKind::RevokeFailed => format!("Revoke {} might fail.", node),
            ErrorKind::TrustFailed => format!("Trust {} might fail.", node),
            ErrorKind::LeakcheckFailed => format!(
                "Leak check for resource {} might fail in {}.",
                node, function
            ),
            ErrorKind::DerivedResourceInvariantFailed => format!(
                "The derived resource {} might not match its underlying resource in {}.",
                node, function
            ),
            ErrorKind::FoldFailed => "Fold might fail.".into(),
            ErrorKind::UnfoldFailed => "Unfold might fail.".into(),
            ErrorKind::LoopInvariantNotPreserved => "Loop invariant might not be preserved.".into(),
            ErrorKind::LoopInvariantNotEstablished => {
                "Loop invariant might not hold on entry.".into()
            }
            ErrorKind::FunctionNotWellformed => "Function might not be well-formed.".into(),
            ErrorKind::PredicateNotWellformed => "Predicate might not be well-formed.".into(),
        }
    }
}

impl Reason {
    pub fn message(&self, node: &str) -> String {
        match self {
            Reason::AssertionFalse => format!("Assertion {} might not hold.", node),
            Reason::TransitivityViolated => "It might not be transitive.".into(),
            Reason::ConstantBalance => "It might assume constant balance.".into(),
            Reason::DivisionByZero => format!("Divisor {} might be zero.", node),
            Reason::SeqIndexLength => format!("Index {} might exceed array length.", node),
            Reason::SeqIndexNegative => format!("Index {} might be negative.", node),
            Reason::NotImplementsInterface => {
                "Receiver might not implement the interface.".into()
            }
            Reason::InsufficientFunds => "There might be insufficient allocated funds.".into(),
            Reason::NoOffer => "There might not be an appropriate offer.".into(),
            Reason::NotACreator => "The actor might not have creator rights.".into(),
            Reason::NotTrusted => "The actor might not be trusted.".into(),
            Reason::OfferNotInjective => format!("The offers of {} might not be injective.", node),
            Reason::NoPerforms => "The function might not declare this resource effect.".into(),
            Reason::AllocationLeaked => "Some allocation might be leaked.".into(),
            Reason::ReceiverNotInjective => {
                format!("Receiver of {} might not be injective.", node)
            }
            Reason::ReceiverNull => format!("Receiver of {} might be null.", node),
            Reason::NegativePermission => format!("Fraction {} might be negative.", node),
            Reason::InsufficientPermission => format!(
                "There might be insufficient permission to access {}.",
                node
            ),
        }
    }
}

/// `kind:reason` pair naming a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputId {
    pub kind: ErrorKind,
    pub reason: Reason,
}

impl OutputId {
    pub fn new(kind: ErrorKind, reason: Reason) -> Self {
        Self { kind, reason }
    }
}

impl std::str::FromStr for OutputId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, reason) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| TypesError::MalformedOutputId(s.to_string()))?;
        Ok(Self {
            kind: kind.trim().parse()?,
            reason: reason.trim().parse()?,
        })
    }
}

impl std::fmt::Display for OutputId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.reason)
    }
}

/// The transaction that first exhibited a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// Number of transactions executed before this one.
    pub depth: usize,
    pub sender: Address,
    pub value: Amount,
    /// Rendered call, e.g. `transfer(0x0002, 1)`.
    pub call: String,
    /// Calls that led to the pre-state, oldest first.
    pub history: Vec<String>,
}

impl std::fmt::Display for Witness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for step in &self.history {
            write!(f, "{} ; ", step)?;
        }
        write!(f, "{} from {}", self.call, self.sender)?;
        if !self.value.is_zero() {
            write!(f, " with value {}", self.value)?;
        }
        Ok(())
    }
}

/// A single verification failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub reason: Reason,
    /// Function the failure was raised in (`__init__` for the constructor).
    pub function: String,
    /// Source label of the failing construct, if it has one.
    pub label: Option<String>,
    /// Source text of the failing construct.
    pub node: Option<String>,
    pub witness: Option<Witness>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, reason: Reason, function: impl Into<String>) -> Self {
        Self {
            kind,
            reason,
            function: function.into(),
            label: None,
            node: None,
            witness: None,
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_witness(mut self, witness: Witness) -> Self {
        self.witness = Some(witness);
        self
    }

    pub fn id(&self) -> OutputId {
        OutputId::new(self.kind, self.reason)
    }

    /// Key under which repeated reports of the same failure collapse.
    pub fn site(&self) -> (OutputId, &str, Option<&str>) {
        (self.id(), self.function.as_str(), self.label.as_deref())
    }

    pub fn message(&self) -> String {
        let node = self.node.as_deref().unwrap_or("?");
        format!(
            "{} {}",
            self.kind.message(&self.function, node),
            self.reason.message(node)
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}", self.message(), self.id())?;
        if let Some(label) = &self.label {
            write!(f, " at {}", label)?;
        }
        write!(f, ")")
    }
}
