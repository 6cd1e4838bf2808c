//! Ordered brand table that collapses a cleaned model name into its family label.
//!
//! The first rule whose detector fires decides the label. New brands are added
//! by appending a row to [`family_rules`].

use regex::Regex;
use std::sync::LazyLock;

use crate::normalize::static_regex;

static DECIMAL_VERSION: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\b(\d+(?:\.\d+)+)[a-z]?\b"));
static N_VERSION: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b(\d+n)\b"));
static INTEGER_VERSION: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b(\d+)\b"));
static CLAUDE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\b(\d+(?:\.\d+)?)\b"));
static O_SERIES: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\bo([1345](?:\.\d+)?)\b"));
static TRI_SIZE: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\b(\d+(?:\.\d+)?)b\b"));
static THINK_WORD: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bthink\b"));
static COMMAND_R: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\br(?:\b|\d|\+)"));
static COMMAND_A: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\ba\b"));

static FAMILY_RULES: LazyLock<Vec<FamilyRule>> = LazyLock::new(family_rules);

/// First version-looking token: a dotted decimal (`4.5`, also in `4.5v`), an
/// `n`-suffixed number (`3n`), then a bare integer.
pub fn extract_version_token(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    [&*DECIMAL_VERSION, &*N_VERSION, &*INTEGER_VERSION]
        .into_iter()
        .find_map(|re| re.captures(&lowered).map(|c| c[1].to_string()))
}

enum Detect {
    /// Any of the substrings occurs in the lowercased name.
    Contains(&'static [&'static str]),
    Pattern(Regex),
}

impl Detect {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Detect::Contains(needles) => needles.iter().any(|n| lowered.contains(n)),
            Detect::Pattern(re) => re.is_match(lowered),
        }
    }
}

enum Version {
    /// A letter-prefixed version such as `v3.2`, `r1`, `k2.5`; rendered uppercase.
    Prefixed(Regex),
    /// A version glued to the brand token, as in `qwen3.5` or `lfm-2`.
    AfterBrand(Regex),
    Token,
}

impl Version {
    fn prefixed(prefixes: &[&str]) -> Self {
        let group = prefixes
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Version::Prefixed(static_regex(&format!(
            r"\b({group})\s*([0-9]+(?:\.[0-9]+)?)[a-z]?\b"
        )))
    }

    fn after_brand(brand: &str) -> Self {
        Version::AfterBrand(static_regex(&format!(
            r"{}\s*[-_ ]*([0-9]+(?:\.[0-9]+)?)",
            regex::escape(brand)
        )))
    }

    fn extract(&self, lowered: &str) -> Option<String> {
        match self {
            Version::Prefixed(re) => re
                .captures(lowered)
                .map(|c| format!("{}{}", c[1].to_uppercase(), &c[2])),
            Version::AfterBrand(re) => re.captures(lowered).map(|c| c[1].to_string()),
            Version::Token => extract_version_token(lowered),
        }
    }
}

enum Label {
    /// `"{brand} {version}"` from the first source that yields one, else the bare brand.
    Versioned {
        brand: &'static str,
        sources: Vec<Version>,
    },
    /// Version plus Sonnet/Opus/Haiku sub-family.
    Claude,
    /// `O{n}`, dropping mini/pro/preview.
    OSeries,
    /// Cohere Command: version, else the R or A line.
    Command,
    /// Tri: parameter size plus an optional Think marker.
    Tri,
}

impl Label {
    fn render(&self, lowered: &str) -> String {
        match self {
            Label::Versioned { brand, sources } => sources
                .iter()
                .find_map(|s| s.extract(lowered))
                .map_or_else(|| brand.to_string(), |v| format!("{brand} {v}")),
            Label::Claude => {
                let family = ["sonnet", "opus", "haiku"]
                    .into_iter()
                    .find(|f| contains_word(lowered, f))
                    .map(title_word);
                let version = CLAUDE_VERSION.captures(lowered).map(|c| c[1].to_string());
                ["Claude".to_string()]
                    .into_iter()
                    .chain(version)
                    .chain(family)
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            Label::OSeries => O_SERIES
                .captures(lowered)
                .map_or_else(String::new, |c| format!("O{}", &c[1])),
            Label::Command => {
                if let Some(version) = extract_version_token(lowered) {
                    format!("Command {version}")
                } else if COMMAND_R.is_match(lowered) {
                    "Command R".to_string()
                } else if COMMAND_A.is_match(lowered) {
                    "Command A".to_string()
                } else {
                    "Command".to_string()
                }
            }
            Label::Tri => {
                let think = if THINK_WORD.is_match(lowered) { " Think" } else { "" };
                match TRI_SIZE.captures(lowered) {
                    Some(c) => format!("Tri {}B{think}", &c[1]),
                    None => format!("Tri{think}"),
                }
            }
        }
    }
}

pub(crate) struct FamilyRule {
    detect: Detect,
    label: Label,
    /// Also applied to image, video and speech model names.
    media: bool,
}

fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|token| token == word)
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn versioned(
    needles: &'static [&'static str],
    brand: &'static str,
    sources: Vec<Version>,
    media: bool,
) -> FamilyRule {
    FamilyRule {
        detect: Detect::Contains(needles),
        label: Label::Versioned { brand, sources },
        media,
    }
}

fn generic(needles: &'static [&'static str], brand: &'static str) -> FamilyRule {
    let sources = needles
        .iter()
        .map(|needle| Version::after_brand(needle))
        .chain([Version::Token])
        .collect();
    versioned(needles, brand, sources, false)
}

fn family_rules() -> Vec<FamilyRule> {
    vec![
        FamilyRule {
            detect: Detect::Contains(&["claude"]),
            label: Label::Claude,
            media: true,
        },
        versioned(&["deepseek"], "DeepSeek", vec![Version::prefixed(&["v", "r"])], true),
        versioned(&["gemini"], "Gemini", vec![Version::Token], true),
        versioned(&["gemma"], "Gemma", vec![Version::Token], true),
        versioned(&["glm"], "GLM", vec![Version::Token], true),
        versioned(&["gpt"], "GPT", vec![Version::Token], true),
        versioned(&["granite"], "Granite", vec![Version::Token], false),
        versioned(
            &["qwen"],
            "Qwen",
            vec![Version::after_brand("qwen"), Version::Token],
            true,
        ),
        versioned(
            &["kimi"],
            "Kimi",
            vec![Version::prefixed(&["k"]), Version::Token],
            true,
        ),
        versioned(
            &["minimax", "mini max"],
            "MiniMax",
            vec![Version::prefixed(&["m"]), Version::Token],
            true,
        ),
        versioned(&["llama", "meta"], "Llama", vec![Version::Token], true),
        versioned(&["grok"], "Grok", vec![Version::Token], true),
        versioned(&["ministral"], "Ministral", vec![Version::Token], false),
        versioned(&["magistral"], "Magistral", vec![Version::Token], false),
        versioned(&["mistral"], "Mistral", vec![Version::Token], true),
        FamilyRule {
            detect: Detect::Pattern(O_SERIES.clone()),
            label: Label::OSeries,
            media: true,
        },
        FamilyRule {
            detect: Detect::Pattern(static_regex(r"\bk2\b")),
            label: Label::Versioned {
                brand: "K2",
                sources: vec![Version::prefixed(&["v"])],
            },
            media: false,
        },
        FamilyRule {
            media: true,
            ..generic(&["ernie", "baidu"], "ERNIE")
        },
        FamilyRule {
            media: true,
            ..generic(&["doubao", "seed"], "Doubao")
        },
        generic(&["exaone"], "EXAONE"),
        generic(&["devstral"], "Devstral"),
        generic(&["jamba"], "Jamba"),
        generic(&["nova"], "Nova"),
        generic(&["phi"], "Phi"),
        generic(&["lfm"], "LFM"),
        generic(&["solar"], "Solar"),
        generic(&["sonar"], "Sonar"),
        generic(&["ling"], "Ling"),
        generic(&["openchat"], "OpenChat"),
        generic(&["olmo"], "OLMo"),
        FamilyRule {
            detect: Detect::Contains(&["command"]),
            label: Label::Command,
            media: false,
        },
        versioned(
            &["nemotron", "nvidia"],
            "NVIDIA Nemotron",
            vec![Version::Token],
            true,
        ),
        FamilyRule {
            detect: Detect::Pattern(static_regex(r"\btri\b")),
            label: Label::Tri,
            media: true,
        },
    ]
}

/// Collapse a cleaned name into its family label, or return it unchanged when
/// no rule applies. With `media_only`, rules for text-only brands are skipped.
pub(crate) fn canonicalize_by_family(name: &str, media_only: bool) -> String {
    let lowered = name.to_lowercase();
    FAMILY_RULES
        .iter()
        .filter(|rule| !media_only || rule.media)
        .find(|rule| rule.detect.matches(&lowered))
        .map(|rule| rule.label.render(&lowered))
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(name: &str) -> String {
        canonicalize_by_family(name, false)
    }

    #[test]
    fn test_extract_version_token() {
        assert_eq!(extract_version_token("GLM 4.5V").as_deref(), Some("4.5"));
        assert_eq!(extract_version_token("GPT 4.1 mini").as_deref(), Some("4.1"));
        assert_eq!(extract_version_token("Gemma 3n E4B").as_deref(), Some("3n"));
        assert_eq!(extract_version_token("Grok 4").as_deref(), Some("4"));
        // The integer rule only sees the digit after the dot.
        assert_eq!(extract_version_token("qwen3.5").as_deref(), Some("5"));
        assert_eq!(extract_version_token("Sonar"), None);
    }

    #[test]
    fn test_claude_keeps_sub_family() {
        assert_eq!(family("Claude 3.5 Sonnet"), "Claude 3.5 Sonnet");
        assert_eq!(family("Claude 4.5 Haiku"), "Claude 4.5 Haiku");
        assert_eq!(family("Claude Opus 4.1"), "Claude 4.1 Opus");
        assert_eq!(family("Claude Instant"), "Claude");
    }

    #[test]
    fn test_prefixed_versions() {
        assert_eq!(family("DeepSeek V3.2"), "DeepSeek V3.2");
        assert_eq!(family("DeepSeek R1"), "DeepSeek R1");
        assert_eq!(family("DeepSeek Coder"), "DeepSeek");
        assert_eq!(family("Kimi K2.5"), "Kimi K2.5");
        assert_eq!(family("Kimi 2"), "Kimi 2");
        assert_eq!(family("MiniMax M2.5"), "MiniMax M2.5");
        assert_eq!(family("MiniMax Text 01"), "MiniMax 01");
    }

    #[test]
    fn test_versions_glued_to_brand() {
        assert_eq!(family("Qwen3.5"), "Qwen 3.5");
        assert_eq!(family("Qwen 2.5 Max"), "Qwen 2.5");
        assert_eq!(family("LFM2.5"), "LFM 2.5");
        assert_eq!(family("OLMo 3.1 Think"), "OLMo 3.1");
        assert_eq!(family("Phi 4 mini"), "Phi 4");
    }

    #[test]
    fn test_common_brands() {
        assert_eq!(family("GPT 4.1 mini"), "GPT 4.1");
        assert_eq!(family("Gemini 2.5 Flash Lite"), "Gemini 2.5");
        assert_eq!(family("Gemma 3n E4B"), "Gemma 3n");
        assert_eq!(family("Llama 3.3"), "Llama 3.3");
        assert_eq!(family("Ministral 8B"), "Ministral");
        assert_eq!(family("Magistral Medium 1.2"), "Magistral 1.2");
        assert_eq!(family("Mistral Large 2"), "Mistral 2");
        assert_eq!(family("NVIDIA Llama Nemotron"), "Llama");
        assert_eq!(family("Nemotron Nano 9B V2"), "NVIDIA Nemotron");
    }

    #[test]
    fn test_o_series_collapses_suffixes() {
        assert_eq!(family("o3 mini"), "O3");
        assert_eq!(family("o1 pro"), "O1");
        assert_eq!(family("o4 mini high"), "O4");
    }

    #[test]
    fn test_k2_command_and_tri() {
        assert_eq!(family("K2 Think V2"), "K2 V2");
        assert_eq!(family("K2"), "K2");
        assert_eq!(family("Command A"), "Command A");
        assert_eq!(family("Command R+"), "Command R");
        assert_eq!(family("Command R7B"), "Command R");
        assert_eq!(family("Command"), "Command");
        assert_eq!(family("Tri 21B think"), "Tri 21B Think");
        assert_eq!(family("Tri"), "Tri");
    }

    #[test]
    fn test_unknown_name_unchanged() {
        assert_eq!(family("Hermes 4"), "Hermes 4");
        assert_eq!(family(""), "");
    }

    #[test]
    fn test_media_only_skips_text_brands() {
        assert_eq!(canonicalize_by_family("Kling 2.1", true), "Kling 2.1");
        assert_eq!(canonicalize_by_family("Kling 2.1", false), "Ling 2.1");
        assert_eq!(canonicalize_by_family("GPT Image 1", true), "GPT 1");
    }

    #[test]
    fn test_vendor_brands_apply_to_media_names() {
        assert_eq!(canonicalize_by_family("Seedream 3.0", true), "Doubao 3.0");
        assert_eq!(canonicalize_by_family("Seedance 1.0 Lite", true), "Doubao 1.0");
        assert_eq!(canonicalize_by_family("ERNIE Image 4.5", true), "ERNIE 4.5");
        assert_eq!(canonicalize_by_family("Baidu Image 1", true), "ERNIE 1");
        assert_eq!(canonicalize_by_family("Meta Movie Gen", true), "Llama");
    }

    #[test]
    fn test_alternate_brand_spellings() {
        assert_eq!(family("Seed 2.0"), "Doubao 2.0");
        assert_eq!(family("seed2.0"), "Doubao 2.0");
        assert_eq!(family("Doubao1.5 Pro"), "Doubao 1.5");
        assert_eq!(family("Meta Llama 3.1"), "Llama 3.1");
    }
}
