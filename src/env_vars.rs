//! Centralized environment variable registry.
//!
//! Single source of truth for the environment variables read by booth. It is
//! printed by `booth env`.
//!
//! Config overrides use the `BOOTH_` prefix with `__` separating nested
//! config paths (e.g., `BOOTH_BOOKING__MAX_QUANTITY`).

/// An environment variable definition
#[derive(Debug, Clone)]
pub struct EnvVar {
    /// Environment variable name (e.g., "BOOTH_BOOKING__MAX_QUANTITY")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Category for grouping in output
    pub category: EnvVarCategory,
    /// Whether this variable is required for operation
    pub required: bool,
    /// Default value if not set
    pub default: Option<&'static str>,
    /// Example value for documentation
    pub example: Option<&'static str>,
}

/// Categories for organizing environment variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVarCategory {
    /// File path configuration
    Paths,
    /// Event and ticket settings
    Booking,
    /// Step validation rules
    Validation,
    /// Avatar image host
    Upload,
    /// Logging configuration
    Logging,
}

impl EnvVarCategory {
    /// Display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            EnvVarCategory::Paths => "Paths",
            EnvVarCategory::Booking => "Booking",
            EnvVarCategory::Validation => "Validation",
            EnvVarCategory::Upload => "Upload",
            EnvVarCategory::Logging => "Logging",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [EnvVarCategory] {
        &[
            EnvVarCategory::Paths,
            EnvVarCategory::Booking,
            EnvVarCategory::Validation,
            EnvVarCategory::Upload,
            EnvVarCategory::Logging,
        ]
    }
}

/// Static registry of all documented environment variables
pub static ENV_VARS: &[EnvVar] = &[
    // === Paths ===
    EnvVar {
        name: "BOOTH_PATHS__STATE",
        description: "Directory holding the saved wizard session, tickets, and logs",
        category: EnvVarCategory::Paths,
        required: false,
        default: Some(".booth"),
        example: Some("/var/lib/booth"),
    },
    // === Booking ===
    EnvVar {
        name: "BOOTH_BOOKING__EVENT_NAME",
        description: "Event name printed on the ticket card",
        category: EnvVarCategory::Booking,
        required: false,
        default: Some("Techember Fest \"25"),
        example: Some("RustConf"),
    },
    EnvVar {
        name: "BOOTH_BOOKING__MAX_QUANTITY",
        description: "Largest number of tickets allowed in one booking",
        category: EnvVarCategory::Booking,
        required: false,
        default: Some("20"),
        example: Some("4"),
    },
    EnvVar {
        name: "BOOTH_BOOKING__TICKET_CODE_PREFIX",
        description: "Prefix of generated ticket codes",
        category: EnvVarCategory::Booking,
        required: false,
        default: Some("TKT"),
        example: Some("RC25"),
    },
    // === Validation ===
    EnvVar {
        name: "BOOTH_VALIDATION__AVATAR_POLICY",
        description: "Whether step 2 requires an avatar URL (optional or required)",
        category: EnvVarCategory::Validation,
        required: false,
        default: Some("optional"),
        example: Some("required"),
    },
    // === Upload ===
    EnvVar {
        name: "BOOTH_UPLOAD__API_KEY",
        description: "Image host API key used by `booth avatar <file>`",
        category: EnvVarCategory::Upload,
        required: false,
        default: None,
        example: Some("0123456789abcdef"),
    },
    EnvVar {
        name: "BOOTH_UPLOAD__ENDPOINT",
        description: "Image host upload endpoint",
        category: EnvVarCategory::Upload,
        required: false,
        default: Some("https://api.imgbb.com/1/upload"),
        example: None,
    },
    EnvVar {
        name: "BOOTH_UPLOAD__TIMEOUT_SECS",
        description: "Upload request timeout in seconds",
        category: EnvVarCategory::Upload,
        required: false,
        default: Some("30"),
        example: Some("10"),
    },
    // === Logging ===
    EnvVar {
        name: "BOOTH_LOGGING__LEVEL",
        description: "Log level when RUST_LOG is not set",
        category: EnvVarCategory::Logging,
        required: false,
        default: Some("warn"),
        example: Some("debug"),
    },
    EnvVar {
        name: "BOOTH_LOGGING__TO_FILE",
        description: "Write logs to <state>/logs instead of stderr",
        category: EnvVarCategory::Logging,
        required: false,
        default: Some("false"),
        example: Some("true"),
    },
    EnvVar {
        name: "RUST_LOG",
        description: "Standard tracing filter, overrides the configured level",
        category: EnvVarCategory::Logging,
        required: false,
        default: None,
        example: Some("booth=debug"),
    },
];

/// Get all env vars for a specific category
pub fn env_vars_for_category(category: EnvVarCategory) -> impl Iterator<Item = &'static EnvVar> {
    ENV_VARS.iter().filter(move |v| v.category == category)
}

/// Get env vars grouped by category, skipping empty categories
pub fn env_vars_by_category() -> Vec<(EnvVarCategory, Vec<&'static EnvVar>)> {
    EnvVarCategory::all()
        .iter()
        .map(|cat| {
            let vars: Vec<&EnvVar> = env_vars_for_category(*cat).collect();
            (*cat, vars)
        })
        .filter(|(_, vars)| !vars.is_empty())
        .collect()
}
