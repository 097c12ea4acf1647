//! End-to-end pipeline checks over the public composition API.

use placement::{
    generate, CompositionError, CompositionParams, CompositionRequest, PaletteRecord, Style,
    Surrounding,
};

fn record(json: serde_json::Value) -> PaletteRecord {
    serde_json::from_value(json).unwrap()
}

fn tree(id: i64, name: &str) -> PaletteRecord {
    record(serde_json::json!({
        "Species ID": id,
        "Scientific Name": name,
        "Plant Type": "Tree",
        "Light Preference": "Full Sun",
        "Hazard": "-",
        "Canopy Radius": 5.0
    }))
}

fn shrub(id: i64, name: &str, light: &str, hazard: &str) -> PaletteRecord {
    record(serde_json::json!({
        "Species ID": id,
        "Scientific Name": name,
        "Plant Type": "Shrub",
        "Light Preference": light,
        "Hazard": hazard,
        "Canopy Radius": 0.5
    }))
}

fn request(
    style: Option<Style>,
    surrounding: Option<Surrounding>,
    palette: Vec<PaletteRecord>,
) -> CompositionRequest {
    CompositionRequest {
        style,
        surrounding,
        plant_palette: palette,
    }
}

fn mixed_palette() -> Vec<PaletteRecord> {
    vec![
        tree(1, "Samanea saman"),
        shrub(2, "Ixora congesta", "Full Sun", "-"),
        shrub(3, "Calathea lutea", "Semi Shade", "Toxic"),
    ]
}

fn parse_key(key: &str) -> (usize, usize) {
    let parts = key
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(", ")
        .map(|part| part.parse().unwrap())
        .collect::<Vec<usize>>();
    (parts[0], parts[1])
}

#[test]
fn walkway_composition_is_internally_consistent() {
    let params = CompositionParams::default().with_seed(7);
    let response = generate(request(None, None, mixed_palette()), &params).unwrap();

    assert_eq!(response.data.len(), 3);

    for composition in &response.data {
        assert_eq!(composition.surrounding_context, Surrounding::Walkway);

        let mut planted_cells = 0;
        for row in &composition.grid {
            for &code in row {
                assert!(code <= 3, "unknown grid code {}", code);
                if code >= 2 {
                    planted_cells += 1;
                }
            }
        }

        // the coordinate map covers the planted cells exactly: one entry
        // per tree or shrub seed, keyed by its cell
        assert_eq!(composition.coordinates.len(), planted_cells);
        for key in composition.coordinates.keys() {
            let (y, x) = parse_key(key);
            assert!(composition.grid[y][x] >= 2);
        }
    }
}

#[test]
fn tree_only_palette_never_marks_shrubs() {
    let params = CompositionParams::default().with_seed(11);
    let palette = vec![
        tree(1, "Samanea saman"),
        tree(2, "Khaya senegalensis"),
        tree(3, "Livistona chinensis"),
    ];

    let response = generate(request(None, None, palette), &params).unwrap();

    for composition in &response.data {
        for row in &composition.grid {
            for &code in row {
                assert_ne!(code, 3, "shrub cell without any shrub species");
            }
        }
    }
}

#[test]
fn shrub_only_palette_never_marks_trees() {
    let params = CompositionParams::default().with_seed(13);
    let palette = vec![
        shrub(4, "Ixora congesta", "Full Sun", "-"),
        shrub(5, "Calathea lutea", "Semi Shade", "Toxic"),
        shrub(6, "Murraya paniculata", "Full Sun", "-"),
    ];

    let response = generate(request(None, Some(Surrounding::Road), palette), &params).unwrap();

    for composition in &response.data {
        assert_eq!(composition.surrounding_context, Surrounding::Road);
        for row in &composition.grid {
            for &code in row {
                assert_ne!(code, 2, "tree cell without any tree species");
            }
        }
    }
}

#[test]
fn manicured_compositions_are_reproducible() {
    let palette = || {
        vec![
            tree(1, "Samanea saman"),
            tree(2, "Khaya senegalensis"),
            shrub(3, "Ixora congesta", "Full Sun", "-"),
            shrub(4, "Calathea lutea", "Semi Shade", "Toxic"),
            shrub(5, "Murraya paniculata", "Full Sun", "-"),
        ]
    };

    let run = || {
        let params = CompositionParams::default().with_seed(42);
        let response = generate(
            request(Some(Style::Manicured), Some(Surrounding::Walkway), palette()),
            &params,
        )
        .unwrap();
        serde_json::to_string(&response).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn empty_palette_is_a_client_error() {
    let params = CompositionParams::default().with_seed(1);
    let result = generate(request(None, None, Vec::new()), &params);

    assert!(matches!(result, Err(CompositionError::PaletteTooSmall(0))));
}
