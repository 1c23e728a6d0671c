//! Artwork selection by aspect-ratio fit
//!
//! Ordering is strict: candidates with a usable aspect ratio first, then the
//! closest ratio, then the taller candidate. Ties after that keep the service order.

use std::cmp::Ordering;

use crate::models::schedules_direct::ImageCandidate;
use crate::utils::url::UrlUtils;

pub const PORTRAIT_ASPECT: f64 = 2.0 / 3.0;
pub const WIDE_ASPECT: f64 = 16.0 / 9.0;

/// Best candidate for `desired`, or `None` for an empty input
pub fn select<'a, I>(candidates: I, desired: f64) -> Option<&'a ImageCandidate>
where
    I: IntoIterator<Item = &'a ImageCandidate>,
{
    candidates
        .into_iter()
        .min_by(|a, b| compare_fit(a, b, desired))
}

fn compare_fit(a: &ImageCandidate, b: &ImageCandidate, desired: f64) -> Ordering {
    let (ratio_a, ratio_b) = (a.aspect_ratio(), b.aspect_ratio());
    (ratio_a == 0.0)
        .cmp(&(ratio_b == 0.0))
        .then_with(|| (desired - ratio_a).abs().total_cmp(&(desired - ratio_b).abs()))
        .then_with(|| b.height_px().cmp(&a.height_px()))
}

/// Resolved artwork URLs for one program root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImages {
    pub primary: Option<String>,
    pub thumb: Option<String>,
    pub backdrop: Option<String>,
}

impl ProgramImages {
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.thumb.is_none() && self.backdrop.is_none()
    }
}

/// Pick primary, thumb and backdrop artwork from one candidate list
pub fn select_program_images(candidates: &[ImageCandidate], image_base: &str) -> ProgramImages {
    let with_text = || candidates.iter().filter(|c| c.has_text() == Some(true));
    let without_text = || candidates.iter().filter(|c| c.has_text() == Some(false));

    let primary = select(with_text(), PORTRAIT_ASPECT)
        .and_then(|c| resolve(c, image_base))
        .or_else(|| select(candidates, PORTRAIT_ASPECT).and_then(|c| resolve(c, image_base)));

    let thumb = select(with_text(), WIDE_ASPECT)
        .and_then(|c| resolve(c, image_base))
        .filter(|uri| primary.as_deref() != Some(uri.as_str()));

    let backdrop = select(without_text(), WIDE_ASPECT).and_then(|c| resolve(c, image_base));

    ProgramImages {
        primary,
        thumb,
        backdrop,
    }
}

fn resolve(candidate: &ImageCandidate, image_base: &str) -> Option<String> {
    candidate
        .uri
        .as_deref()
        .filter(|uri| !uri.trim().is_empty())
        .map(|uri| UrlUtils::resolve_image(image_base, uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BASE: &str = "https://json.example.org/20141201";

    #[test]
    fn test_exact_portrait_match_wins() {
        let candidates = vec![
            ImageCandidate::new("2", "3", true, "p.jpg"),
            ImageCandidate::new("16", "9", true, "w.jpg"),
        ];
        let chosen = select(&candidates, PORTRAIT_ASPECT).unwrap();
        assert_eq!(chosen.uri.as_deref(), Some("p.jpg"));
    }

    #[test]
    fn test_zero_ratio_candidate_loses() {
        let candidates = vec![
            ImageCandidate::new("0", "0", true, "zero.jpg"),
            ImageCandidate::new("4", "3", true, "four-three.jpg"),
        ];
        let chosen = select(&candidates, WIDE_ASPECT).unwrap();
        assert_eq!(chosen.uri.as_deref(), Some("four-three.jpg"));
    }

    #[test]
    fn test_zero_ratio_never_beats_distant_valid_candidate() {
        let candidates = vec![
            ImageCandidate::new("0", "0", true, "zero.jpg"),
            ImageCandidate::new("1920", "1080", true, "wide.jpg"),
        ];
        let chosen = select(&candidates, PORTRAIT_ASPECT).unwrap();
        assert_eq!(chosen.uri.as_deref(), Some("wide.jpg"));
    }

    #[test]
    fn test_zero_ratio_candidate_selected_when_alone() {
        let candidates = vec![ImageCandidate::new("", "", true, "only.jpg")];
        assert_eq!(
            select(&candidates, WIDE_ASPECT).and_then(|c| c.uri.as_deref()),
            Some("only.jpg")
        );
    }

    #[test]
    fn test_equal_fit_prefers_taller_then_service_order() {
        let candidates = vec![
            ImageCandidate::new("240", "360", true, "small.jpg"),
            ImageCandidate::new("960", "1440", true, "large.jpg"),
            ImageCandidate::new("960", "1440", true, "large-dup.jpg"),
        ];
        let chosen = select(&candidates, PORTRAIT_ASPECT).unwrap();
        assert_eq!(chosen.uri.as_deref(), Some("large.jpg"));
    }

    #[test]
    fn test_empty_input_selects_nothing() {
        assert!(select(&Vec::<ImageCandidate>::new(), PORTRAIT_ASPECT).is_none());
        assert!(select_program_images(&[], BASE).is_empty());
    }

    #[test]
    fn test_program_images_roles() {
        let candidates = vec![
            ImageCandidate::new("240", "360", true, "assets/poster.jpg"),
            ImageCandidate::new("1920", "1080", true, "assets/banner.jpg"),
            ImageCandidate::new("1920", "1080", false, "https://cdn.example.org/backdrop.jpg"),
        ];
        let images = select_program_images(&candidates, BASE);

        assert_eq!(
            images.primary.as_deref(),
            Some("https://json.example.org/20141201/image/assets/poster.jpg")
        );
        assert_eq!(
            images.thumb.as_deref(),
            Some("https://json.example.org/20141201/image/assets/banner.jpg")
        );
        assert_eq!(
            images.backdrop.as_deref(),
            Some("https://cdn.example.org/backdrop.jpg")
        );
    }

    #[test]
    fn test_primary_falls_back_to_textless_candidates() {
        let candidates = vec![
            ImageCandidate::new("240", "360", false, "textless-poster.jpg"),
            ImageCandidate::new("1920", "1080", false, "textless-wide.jpg"),
        ];
        let images = select_program_images(&candidates, BASE);

        assert!(images.primary.unwrap().ends_with("textless-poster.jpg"));
        assert!(images.thumb.is_none());
        assert!(images.backdrop.unwrap().ends_with("textless-wide.jpg"));
    }

    #[test]
    fn test_thumb_identical_to_primary_is_dropped() {
        // Only one text-bearing image: it wins both portrait and wide selection
        let candidates = vec![ImageCandidate::new("1920", "1080", true, "assets/only.jpg")];
        let images = select_program_images(&candidates, BASE);

        assert!(images.primary.is_some());
        assert!(images.thumb.is_none());
        assert!(images.backdrop.is_none());
    }

    proptest! {
        #[test]
        fn prop_valid_candidate_beats_zero_ratio(
            width in 1i64..5000,
            height in 1i64..5000,
            desired in 0.1f64..4.0,
            zero_first in any::<bool>(),
        ) {
            let valid = ImageCandidate::new(&width.to_string(), &height.to_string(), true, "valid");
            let zero = ImageCandidate::new("0", &height.to_string(), true, "zero");
            let candidates = if zero_first {
                vec![zero, valid]
            } else {
                vec![valid, zero]
            };

            let chosen = select(&candidates, desired).unwrap();
            prop_assert_eq!(chosen.uri.as_deref(), Some("valid"));
        }

        #[test]
        fn prop_selection_is_minimal(
            dims in proptest::collection::vec((0i64..3000, 0i64..3000), 1..12),
            desired in 0.1f64..4.0,
        ) {
            let candidates: Vec<ImageCandidate> = dims
                .iter()
                .enumerate()
                .map(|(i, (w, h))| ImageCandidate::new(&w.to_string(), &h.to_string(), true, &i.to_string()))
                .collect();

            let chosen = select(&candidates, desired).unwrap();
            let best = (desired - chosen.aspect_ratio()).abs();
            for candidate in candidates.iter().filter(|c| c.aspect_ratio() != 0.0) {
                prop_assert!(chosen.aspect_ratio() != 0.0);
                prop_assert!(best <= (desired - candidate.aspect_ratio()).abs());
            }
        }
    }
}
