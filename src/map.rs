use crate::backend::{MapCenter, Place};
use crate::locale::Language;

/// Fallback view center when a reply carries no usable center: Istanbul.
pub const DEFAULT_CENTER: (f64, f64) = (41.0082, 28.9784);

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// (lat, lon) the map is framed around.
    pub center: (f64, f64),
    pub center_label: Option<String>,
    pub markers: Vec<Marker>,
}

impl Default for MapView {
    fn default() -> Self {
        plan_view(None, &[], Language::default())
    }
}

/// Turn the latest reply's geography into what the map draws. Pure: the same
/// `(center, places)` input always produces the same view.
///
/// Places without both coordinates stay in the session's place list but never
/// become markers. An empty marker set gets one synthesized marker at the
/// fallback center so the map is never blank.
pub fn plan_view(center: Option<&MapCenter>, places: &[Place], language: Language) -> MapView {
    let valid_center = center.and_then(MapCenter::coordinates);
    let view_center = valid_center.unwrap_or(DEFAULT_CENTER);

    let mut markers: Vec<Marker> = places
        .iter()
        .filter_map(|place| {
            place.coordinates().map(|(lat, lon)| Marker {
                name: place.name.clone(),
                lat,
                lon,
            })
        })
        .collect();

    if markers.is_empty() {
        markers.push(Marker {
            name: language.copy().default_marker.to_string(),
            lat: DEFAULT_CENTER.0,
            lon: DEFAULT_CENTER.1,
        });
    }

    MapView {
        center: view_center,
        center_label: valid_center.and_then(|_| center.and_then(|c| c.label.clone())),
        markers,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn place(name: &str, lat: Option<f64>, lon: Option<f64>) -> Place {
        Place {
            name: name.to_string(),
            lat,
            lon,
            address: None,
        }
    }

    #[test]
    fn keeps_only_places_with_both_coordinates() {
        let center = MapCenter {
            lat: Some(41.05),
            lon: Some(29.00),
            label: None,
        };
        let places = vec![
            place("A", Some(41.05), Some(29.00)),
            place("B", None, None),
            place("C", Some(41.02), None),
        ];

        let view = plan_view(Some(&center), &places, Language::English);

        assert_eq!(view.center, (41.05, 29.00));
        let names: Vec<&str> = view.markers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn empty_place_list_yields_one_default_marker() {
        let view = plan_view(None, &[], Language::English);

        assert_eq!(view.center, DEFAULT_CENTER);
        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].name, "Istanbul");
        assert_eq!((view.markers[0].lat, view.markers[0].lon), DEFAULT_CENTER);
    }

    #[test]
    fn all_filtered_out_also_yields_default_marker_at_fallback_center() {
        let places = vec![place("B", None, None)];
        let view = plan_view(None, &places, Language::Turkish);

        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].name, "İstanbul");
        assert_eq!((view.markers[0].lat, view.markers[0].lon), DEFAULT_CENTER);
    }

    #[test]
    fn center_missing_a_coordinate_falls_back() {
        let center = MapCenter {
            lat: Some(41.05),
            lon: None,
            label: Some("nowhere".to_string()),
        };

        let view = plan_view(Some(&center), &[], Language::English);

        assert_eq!(view.center, DEFAULT_CENTER);
        assert_eq!(view.center_label, None);
    }

    #[test]
    fn non_finite_coordinates_do_not_render() {
        let places = vec![place("NaN", Some(f64::NAN), Some(29.0))];
        let view = plan_view(None, &places, Language::English);

        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].name, "Istanbul");
    }

    #[test]
    fn planning_is_idempotent() {
        let center = MapCenter {
            lat: Some(40.99),
            lon: Some(29.03),
            label: Some("Moda".to_string()),
        };
        let places = vec![
            place("A", Some(40.99), Some(29.03)),
            place("B", Some(41.00), Some(29.01)),
        ];

        let first = plan_view(Some(&center), &places, Language::English);
        let second = plan_view(Some(&center), &places, Language::English);

        assert_eq!(first, second);
        assert_eq!(first.center_label.as_deref(), Some("Moda"));
    }
}
