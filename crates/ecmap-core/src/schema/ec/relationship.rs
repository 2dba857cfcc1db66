use super::QualifiedName;

use serde::{Deserialize, Serialize};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub strength: Strength,
    pub strength_direction: StrengthDirection,
    pub source: Constraint,
    pub target: Constraint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub multiplicity: Multiplicity,
    pub polymorphic: bool,
    pub role_label: Option<String>,
    pub abstract_constraint: Option<QualifiedName>,
    pub classes: Vec<QualifiedName>,
}

/// Lower and upper bound of a relationship end. `upper == None` is `*`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Multiplicity {
    pub lower: u32,
    pub upper: Option<u32>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    #[default]
    Referencing,
    Holding,
    Embedding,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrengthDirection {
    #[default]
    Forward,
    Backward,
}

/// One end of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum End {
    Source,
    Target,
}

impl Relationship {
    pub fn new(source: Constraint, target: Constraint) -> Self {
        Self {
            strength: Strength::Referencing,
            strength_direction: StrengthDirection::Forward,
            source,
            target,
        }
    }

    pub fn constraint(&self, end: End) -> &Constraint {
        match end {
            End::Source => &self.source,
            End::Target => &self.target,
        }
    }
}

impl Constraint {
    pub fn new(multiplicity: Multiplicity, classes: Vec<QualifiedName>) -> Self {
        Self {
            multiplicity,
            polymorphic: true,
            role_label: None,
            abstract_constraint: None,
            classes,
        }
    }
}

impl Multiplicity {
    pub const ZERO_ONE: Multiplicity = Multiplicity::new(0, Some(1));
    pub const ONE_ONE: Multiplicity = Multiplicity::new(1, Some(1));
    pub const ZERO_MANY: Multiplicity = Multiplicity::new(0, None);
    pub const ONE_MANY: Multiplicity = Multiplicity::new(1, None);

    pub const fn new(lower: u32, upper: Option<u32>) -> Self {
        Self { lower, upper }
    }

    /// True when at most one instance may sit at this end.
    pub fn is_single(&self) -> bool {
        self.upper == Some(1)
    }
}

impl End {
    pub fn opposite(self) -> End {
        match self {
            End::Source => End::Target,
            End::Target => End::Source,
        }
    }
}

impl fmt::Debug for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "({}..{})", self.lower, upper),
            None => write!(f, "({}..*)", self.lower),
        }
    }
}

impl fmt::Display for End {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            End::Source => "Source",
            End::Target => "Target",
        })
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for StrengthDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
