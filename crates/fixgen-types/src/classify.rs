//! Declaration classifier.

use crate::blueprint::Declaration;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclarationClass {
    Plain,
    Lazy,
    Nested,
    Reverse,
    PostHook,
}

impl DeclarationClass {
    /// Usable as a constructor argument.
    pub fn is_pre_construction(self) -> bool {
        matches!(self, DeclarationClass::Plain | DeclarationClass::Lazy | DeclarationClass::Nested)
    }

    /// Applied to the instance after it exists.
    pub fn is_post_construction(self) -> bool {
        !self.is_pre_construction()
    }
}

/// Classifies a declaration. Any value that is not lazy (sequences, sentinels,
/// literals) is plain.
pub fn classify(declaration: &Declaration) -> DeclarationClass {
    match declaration {
        Declaration::Plain(Value::Lazy(_)) => DeclarationClass::Lazy,
        Declaration::Plain(_) => DeclarationClass::Plain,
        Declaration::Nested(_) => DeclarationClass::Nested,
        Declaration::Reverse(_) => DeclarationClass::Reverse,
        Declaration::PostHook(_) => DeclarationClass::PostHook,
    }
}
