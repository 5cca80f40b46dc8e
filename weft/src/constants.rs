use regex::Regex;
use std::sync::OnceLock;

/// Name of the project-level configuration file.
pub const CONFIG_FILENAME: &str = ".weft.toml";

/// Default prefix stripped from `Shadow` members during prepare.
pub const DEFAULT_SHADOW_PREFIX: &str = "shadow$";

/// Instance initializer name.
pub const CTOR: &str = "<init>";

/// Static initializer name.
pub const CLINIT: &str = "<clinit>";

/// Reserved field name giving fragment authors a super-call-like syntax.
/// It has no runtime representation and is always stripped.
pub const IMAGINARY_SUPER: &str = "super$";

/// Separator used when composing engine-invented unique names.
pub const UNIQUE_SEPARATOR: char = '$';

/// Matches field accessor names: `getFoo`, `isFoo`, `setFoo`.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_accessor_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^(get|is|set)(([A-Z])(.*?))(_\$md.*)?$")
            .expect("Invalid accessor name regex pattern")
    })
}

/// Matches invoker names: `callFoo`, `invokeFoo`.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_invoker_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^(call|invoke)(([A-Z])(.*?))(_\$md.*)?$")
            .expect("Invalid invoker name regex pattern")
    })
}
