//! Completion context classification.
//!
//! The context decides which pools of the symbol table feed the candidate
//! list: everything visible at top level, the members of one inferred class
//! and its ancestors, the children of a module path, or the signature of the
//! function being called.

/// Where the cursor sits, as far as completion is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// Plain name position: constants, functions, and constructors all
    /// compete.
    TopLevel,
    /// Inside the argument parens of a free function call.
    Function {
        name: String,
        /// A `)` already sits right of the cursor, so the rendered call
        /// replacement drops its own trailing paren.
        strip_closing_paren: bool,
    },
    /// Inside the argument parens of an attribute call. The receiver is
    /// unknown, so every class contributes its members of that name.
    Method {
        name: String,
        strip_closing_paren: bool,
    },
    /// Attribute lookup on an inferred instance. `class` is the
    /// fully-qualified class name when inference succeeded; `parents` are
    /// its recorded bases.
    Instance {
        class: Option<String>,
        parents: Vec<String>,
    },
    /// Import statement or attribute chain that resolved to a module.
    Module {
        path: String,
        /// True after `from M import ` or a trailing dot: offer the
        /// module's own members, not just child module names.
        show_members: bool,
    },
}
