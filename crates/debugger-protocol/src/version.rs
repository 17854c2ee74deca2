//! Backend version banner parsing.

/// Version information extracted from a `gdb --version` style banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GdbVersion {
    /// `major * 10000 + minor * 100 + patch`.
    pub version: i32,
    pub build: i32,
    pub is_apple: bool,
    pub is_qnx: bool,
}

impl GdbVersion {
    /// Extracts the version from the first line(s) of a backend banner.
    ///
    /// The first dotted number is the version. Digits following the first
    /// separator after it form the build number.
    #[must_use]
    pub fn from_banner(banner: &str) -> Self {
        let skip_parenthesized = ["rubenvb", "openSUSE", "SUSE Linux Enterprise"]
            .iter()
            .any(|vendor| banner.contains(vendor));

        let mut cleaned = String::new();
        let mut build = String::new();
        let mut in_clean = true;
        let mut in_parenthesis = false;
        for c in banner.chars() {
            if in_clean && !cleaned.is_empty() && c != '.' && (is_punct(c) || c.is_whitespace()) {
                in_clean = false;
            }
            if skip_parenthesized {
                if !in_parenthesis && c == '(' {
                    in_parenthesis = true;
                }
                if in_parenthesis && c == ')' {
                    in_parenthesis = false;
                }
                if in_parenthesis {
                    continue;
                }
            }
            let target = if in_clean { &mut cleaned } else { &mut build };
            if c.is_ascii_digit() {
                target.push(c);
            } else if !target.is_empty() && !target.ends_with('.') {
                target.push('.');
            }
        }

        let is_apple = banner.contains("Apple version");
        let is_qnx = banner.contains("qnx");
        let version = 10000 * section(&cleaned, 0) + 100 * section(&cleaned, 1) + section(&cleaned, 2);
        let build = if is_apple {
            section(&build, 1)
        } else if cleaned.matches('.').count() >= 3 {
            section(&cleaned, 3)
        } else {
            section(&build, 0)
        };
        Self {
            version,
            build,
            is_apple,
            is_qnx,
        }
    }
}

fn section(text: &str, index: usize) -> i32 {
    text.split('.')
        .nth(index)
        .and_then(|part| part.parse().ok())
        .unwrap_or(0)
}

/// Unicode punctuation in the ASCII range; symbols such as `~` or `+` are not.
fn is_punct(c: char) -> bool {
    matches!(
        c,
        '!' | '"'
            | '#'
            | '%'
            | '&'
            | '\''
            | '('
            | ')'
            | '*'
            | ','
            | '-'
            | '.'
            | '/'
            | ':'
            | ';'
            | '?'
            | '@'
            | '['
            | '\\'
            | ']'
            | '_'
            | '{'
            | '}'
    )
}
