use common::*;
use serde::{Deserialize, Serialize};

/// Catalogue species identifier, integer or text depending on the source
/// database
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(untagged)]
pub enum SpeciesId {
    Int(i64),
    Text(String),
}

/// One field that some catalogue exports serialise as a string and others
/// as a list of strings
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum RadiusField {
    Value(f64),
    Text(String),
}

/// A plant record as supplied by the palette selection service. Unknown
/// fields are ignored.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PaletteRecord {
    #[serde(rename = "Species ID")]
    pub species_id: SpeciesId,

    #[serde(rename = "Scientific Name")]
    pub scientific_name: String,

    #[serde(rename = "Plant Type")]
    pub plant_type: TextOrList,

    #[serde(rename = "Light Preference")]
    pub light_preference: TextOrList,

    /// "-" marks a hazard-free plant that may line the plot border
    #[serde(rename = "Hazard", default = "default_hazard")]
    pub hazard: String,

    #[serde(rename = "Canopy Radius", default)]
    canopy_radius: RadiusField,
}

/// The palette partitioned by growth habit
#[derive(Clone, Debug, Default)]
pub struct SplitPalette {
    pub trees: Vec<PaletteRecord>,
    pub shrubs: Vec<PaletteRecord>,
}

fn default_hazard() -> String {
    "-".to_owned()
}

impl Default for RadiusField {
    fn default() -> Self {
        RadiusField::Text("None".to_owned())
    }
}

/// Case-insensitive whole-word search, so "Shrub" does not match
/// "Shrubbery-like"
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let phrase = phrase.to_lowercase();

    let boundary = |c: Option<char>| c.map(|c| !c.is_alphanumeric()).unwrap_or(true);

    let mut search_from = 0;
    while let Some(found) = haystack[search_from..].find(&phrase) {
        let start = search_from + found;
        let end = start + phrase.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        if boundary(before) && boundary(after) {
            return true;
        }
        search_from = start + 1;
    }

    false
}

impl TextOrList {
    pub fn contains_word(&self, word: &str) -> bool {
        match self {
            TextOrList::Text(s) => contains_phrase(s, word),
            TextOrList::List(items) => items.iter().any(|s| contains_phrase(s, word)),
        }
    }
}

impl PaletteRecord {
    pub fn is_tree(&self) -> bool {
        self.plant_type.contains_word("Tree") || self.plant_type.contains_word("Palm")
    }

    pub fn is_shrub(&self) -> bool {
        self.plant_type.contains_word("Shrub")
    }

    /// Shade lovers thrive under a tree canopy
    pub fn is_shade_loving(&self) -> bool {
        self.light_preference.contains_word("Semi Shade")
            || self.light_preference.contains_word("Full Shade")
    }

    /// Hazard-free plants are the only ones allowed along the border
    pub fn is_border_friendly(&self) -> bool {
        self.hazard == "-"
    }

    pub fn canopy_radius(&self) -> f64 {
        match &self.canopy_radius {
            RadiusField::Value(v) => *v,
            RadiusField::Text(_) => 0.0,
        }
    }
}

impl SplitPalette {
    pub fn split(records: Vec<PaletteRecord>) -> Self {
        let mut palette = SplitPalette::default();

        for record in records {
            if record.is_tree() {
                palette.trees.push(record);
            } else if record.is_shrub() {
                palette.shrubs.push(record);
            } else {
                warn!(
                    "ignoring palette record with unusable plant type";
                    "species" => &record.scientific_name,
                );
            }
        }

        palette
    }

    pub fn usable_len(&self) -> usize {
        self.trees.len() + self.shrubs.len()
    }
}

impl Display for SpeciesId {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            SpeciesId::Int(i) => write!(f, "{}", i),
            SpeciesId::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn record(
        id: i64,
        name: &str,
        plant_type: &str,
        light: &str,
        hazard: &str,
        radius: f64,
    ) -> PaletteRecord {
        PaletteRecord {
            species_id: SpeciesId::Int(id),
            scientific_name: name.to_owned(),
            plant_type: TextOrList::Text(plant_type.to_owned()),
            light_preference: TextOrList::Text(light.to_owned()),
            hazard: hazard.to_owned(),
            canopy_radius: RadiusField::Value(radius),
        }
    }

    #[test]
    fn word_matching_is_word_bounded() {
        assert!(contains_phrase("Shrub, Creeper", "Shrub"));
        assert!(contains_phrase("large shrub", "Shrub"));
        assert!(!contains_phrase("Shrubbery", "Shrub"));
        assert!(contains_phrase("Full Shade; Semi Shade", "Semi Shade"));
        assert!(!contains_phrase("Full Shadey", "Full Shade"));
    }

    #[test]
    fn splits_trees_and_palms_from_shrubs() {
        let records = vec![
            record(1, "Samanea saman", "Tree", "Full Sun", "-", 10.0),
            record(2, "Livistona chinensis", "Palm", "Full Sun", "-", 4.0),
            record(3, "Ixora congesta", "Shrub", "Full Sun", "-", 0.5),
            record(4, "Epipremnum aureum", "Creeper", "Semi Shade", "-", 0.0),
        ];

        let palette = SplitPalette::split(records);
        assert_eq!(palette.trees.len(), 2);
        assert_eq!(palette.shrubs.len(), 1);
        assert_eq!(palette.usable_len(), 3);
    }

    #[test]
    fn radius_none_becomes_zero() {
        let json = r#"{
            "Species ID": "abc-123",
            "Scientific Name": "Ficus microcarpa",
            "Plant Type": ["Tree", "Shrub"],
            "Light Preference": ["Full Sun"],
            "Hazard": "-",
            "Canopy Radius": "None"
        }"#;

        let record: PaletteRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_tree());
        assert_eq!(record.canopy_radius(), 0.0);
        assert_eq!(record.species_id, SpeciesId::Text("abc-123".to_owned()));
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{
            "Species ID": 9,
            "Scientific Name": "Murraya paniculata",
            "Plant Type": "Shrub",
            "Light Preference": "Full Sun"
        }"#;

        let record: PaletteRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_border_friendly());
        assert_eq!(record.canopy_radius(), 0.0);
    }
}
