//! Product-name rules for image, video and speech models.

use regex::Regex;
use std::sync::LazyLock;

use crate::normalize::static_regex;

use super::{collapse_spaces, title_case};

static FLUX: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"flux\s*\.?\s*([0-9]+(?:\.[0-9]+)?)"));
static STEP1X_EDIT: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bstep1x\s*edit\b"));
static INWORLD_TTS: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"inworld\s*tts\s*([0-9]+(?:\.[0-9]+)?)"));
static TITAN_G1: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bamazon\s+titan\s+g1\b"));
static HUNYUAN_IMAGE_3: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\bhunyuanimage\s*3\.0\b"));
static SORA_2: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bsora\s*2\b"));
static REVE_V1: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\breve\s*v?1\b"));
static HAILUO_23: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b2\.3\b"));
static HAILUO_02: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b0?2\b"));
static VEO: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\bveo\s*([0-9]+(?:\.[0-9]+)?)"));
static VIDU_Q: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b(vidu\s*q[0-9]+)\b"));
static IMAGEN_4: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bimagen\s*4\b"));
static IDEOGRAM_V2: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bideogram\s*v?2"));
static LUCID_ORIGIN: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\blucid\s+origin\b"));
static LUMA_PHOTON: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\bluma\s+photon\b"));
static STABLE_DIFFUSION: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(r"\bstable\s+diffusion\s+([0-9]+(?:\.[0-9]+)?)\b")
});

static TRAILING_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\s*[\(\[].*?[\)\]]\s*$"));
static TAIL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(
        r"(?i)(?:\s+|-)(?:max|turbo|fast|standard|ultra|preview|pro|plus|lite|instruct|flash|director)$",
    )
});

/// A media rule gets the lowercased name and returns a label, or `None` to
/// let the next rule try.
type MediaRule = fn(&str) -> Option<String>;

const MEDIA_RULES: &[MediaRule] = &[
    flux,
    |low| STEP1X_EDIT.is_match(low).then(|| "Step1X Edit".to_string()),
    inworld_tts,
    |low| TITAN_G1.is_match(low).then(|| "Amazon Titan G1".to_string()),
    |low| HUNYUAN_IMAGE_3.is_match(low).then(|| "HunyuanImage 3.0".to_string()),
    |low| SORA_2.is_match(low).then(|| "Sora 2".to_string()),
    |low| REVE_V1.is_match(low).then(|| "Reve V1".to_string()),
    hailuo,
    |low| low.contains("runway gen 3 alpha").then(|| "Runway Gen 3 Alpha".to_string()),
    |low| VEO.captures(low).map(|c| format!("Veo {}", &c[1])),
    |low| {
        VIDU_Q
            .captures(low)
            .map(|c| collapse_spaces(&title_case(&c[1])))
    },
    |low| IMAGEN_4.is_match(low).then(|| "Imagen 4".to_string()),
    |low| IDEOGRAM_V2.is_match(low).then(|| "Ideogram v2".to_string()),
    |low| LUCID_ORIGIN.is_match(low).then(|| "Lucid Origin".to_string()),
    |low| LUMA_PHOTON.is_match(low).then(|| "Luma Photon".to_string()),
    |low| {
        STABLE_DIFFUSION
            .captures(low)
            .map(|c| format!("Stable Diffusion {}", &c[1]))
    },
];

fn flux(low: &str) -> Option<String> {
    if !low.contains("flux") {
        return None;
    }
    let version: f64 = FLUX.captures(low)?[1].parse().ok()?;
    let major = version.trunc() as u32;
    matches!(major, 1 | 2).then(|| format!("Flux {major}"))
}

fn inworld_tts(low: &str) -> Option<String> {
    if !low.contains("inworld tts") {
        return None;
    }
    Some(match INWORLD_TTS.captures(low) {
        Some(c) => format!("Inworld TTS {}", &c[1]),
        None => "Inworld TTS".to_string(),
    })
}

fn hailuo(low: &str) -> Option<String> {
    if !low.contains("hailuo") {
        None
    } else if HAILUO_23.is_match(low) {
        Some("Hailuo 2.3".to_string())
    } else if HAILUO_02.is_match(low) {
        Some("Hailuo 02".to_string())
    } else {
        None
    }
}

pub(crate) fn canonicalize_media(name: &str) -> String {
    let low = name.to_lowercase();
    MEDIA_RULES
        .iter()
        .find_map(|rule| rule(&low))
        .unwrap_or_else(|| name.to_string())
}

/// Drop trailing bracketed annotations, then trailing marketing words, each
/// until nothing more changes.
pub fn trim_tail_noise(name: &str) -> String {
    let mut current = collapse_spaces(name);
    loop {
        let next = TRAILING_BRACKET.replace(&current, "").trim().to_string();
        if next == current {
            break;
        }
        current = next;
    }
    loop {
        let next = TAIL_WORD.replace(&current, "").trim().to_string();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_major_versions() {
        assert_eq!(canonicalize_media("FLUX.1 Kontext"), "Flux 1");
        assert_eq!(canonicalize_media("FLUX 2 Pro"), "Flux 2");
        assert_eq!(canonicalize_media("Flux 3"), "Flux 3");
        assert_eq!(canonicalize_media("Flux Schnell"), "Flux Schnell");
    }

    #[test]
    fn test_literal_products() {
        assert_eq!(canonicalize_media("Step1X Edit v2"), "Step1X Edit");
        assert_eq!(canonicalize_media("Inworld TTS 1.5 Max"), "Inworld TTS 1.5");
        assert_eq!(canonicalize_media("Inworld TTS"), "Inworld TTS");
        assert_eq!(canonicalize_media("Amazon Titan G1 v2"), "Amazon Titan G1");
        assert_eq!(canonicalize_media("HunyuanImage 3.0"), "HunyuanImage 3.0");
        assert_eq!(canonicalize_media("Sora 2 Pro"), "Sora 2");
        assert_eq!(canonicalize_media("Reve v1"), "Reve V1");
        assert_eq!(canonicalize_media("Runway Gen 3 Alpha Turbo"), "Runway Gen 3 Alpha");
        assert_eq!(canonicalize_media("Imagen 4 Ultra"), "Imagen 4");
        assert_eq!(canonicalize_media("Ideogram V2 Turbo"), "Ideogram v2");
        assert_eq!(canonicalize_media("Lucid Origin"), "Lucid Origin");
        assert_eq!(canonicalize_media("Luma Photon Flash"), "Luma Photon");
    }

    #[test]
    fn test_versioned_products_fall_through() {
        assert_eq!(canonicalize_media("Hailuo 2.3 Fast"), "Hailuo 2.3");
        assert_eq!(canonicalize_media("Hailuo 02 Pro"), "Hailuo 02");
        assert_eq!(canonicalize_media("Hailuo Director"), "Hailuo Director");
        assert_eq!(canonicalize_media("Veo 3.1 Fast"), "Veo 3.1");
        assert_eq!(canonicalize_media("Veo"), "Veo");
        assert_eq!(canonicalize_media("Vidu Q2 Turbo"), "Vidu Q2");
        assert_eq!(canonicalize_media("Stable Diffusion 3.5 Large"), "Stable Diffusion 3.5");
        assert_eq!(canonicalize_media("Stable Diffusion XL"), "Stable Diffusion XL");
    }

    #[test]
    fn test_trim_tail_noise() {
        assert_eq!(trim_tail_noise("Kling 2.1 Pro (Master)"), "Kling 2.1");
        assert_eq!(trim_tail_noise("Seedance 1.0 Lite Fast"), "Seedance 1.0");
        assert_eq!(trim_tail_noise("Wan 2.2-Turbo [beta]"), "Wan 2.2");
        assert_eq!(trim_tail_noise("Pro"), "Pro");
        assert_eq!(trim_tail_noise("  Midjourney   v7 "), "Midjourney v7");
    }
}
