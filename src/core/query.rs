//! Parsing of rate query arguments, from the command line or a chat message

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuery {
    pub base: String,
    pub targets: Vec<String>,
}

impl RateQuery {
    /// Builds a query from positional arguments: the first is the base
    /// currency, the rest are targets. Codes are uppercased. Missing parts
    /// fall back to the defaults.
    pub fn from_args<S: AsRef<str>>(
        args: &[S],
        default_base: &str,
        default_targets: &[String],
    ) -> Self {
        let mut codes = args
            .iter()
            .map(|a| a.as_ref().trim().to_uppercase())
            .filter(|a| !a.is_empty());

        let base = codes.next().unwrap_or_else(|| default_base.to_uppercase());
        let mut targets: Vec<String> = codes.collect();
        if targets.is_empty() {
            targets = default_targets.iter().map(|t| t.to_uppercase()).collect();
        }

        RateQuery { base, targets }
    }

    /// Parses a chat command such as `/rate USD JPY EUR`. The leading
    /// command word is ignored.
    pub fn from_message(message: &str, default_base: &str, default_targets: &[String]) -> Self {
        let parts: Vec<&str> = message.split_whitespace().skip(1).collect();
        Self::from_args(&parts, default_base, default_targets)
    }
}
