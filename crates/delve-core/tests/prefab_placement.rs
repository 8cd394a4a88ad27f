use std::sync::Arc;

use delve_core::dungeon::{Canvas, CellType, CountingFactory, GridCanvas};
use delve_core::prefab::{
    Instruction, Layer, PlacementSpec, Prefab, PrefabPattern, Rotation, Transform, place_pattern,
    place_prefab,
};
use delve_core::{Coord, GameRng};

fn tiles(c: char) -> Vec<Instruction> {
    let tile = match c {
        '#' => CellType::Wall,
        '.' => CellType::Floor,
        '~' => CellType::Water,
        '^' => CellType::Hole,
        '+' => CellType::Door,
        _ => CellType::Stone,
    };
    vec![Instruction::Tile(tile)]
}

fn all_transforms() -> Vec<Transform> {
    let mut out = Vec::new();
    for turns in 0..4 {
        for mirror_x in [false, true] {
            for mirror_y in [false, true] {
                out.push(Transform {
                    rotation: Rotation::from_quarter_turns(turns),
                    mirror_x,
                    mirror_y,
                    centered: false,
                });
            }
        }
    }
    out
}

fn rows(canvas: &GridCanvas) -> Vec<Vec<CellType>> {
    (0..canvas.height()).map(|y| canvas.row(y).to_vec()).collect()
}

#[test]
fn test_four_quarter_turns_are_identity() {
    let p = PrefabPattern::from_rows(&["#.", "~^"], tiles).unwrap();
    let quarter = Transform::rotated(Rotation::R90);
    let mut turned = p.clone();
    for _ in 0..4 {
        turned = turned.transformed(&quarter);
    }
    assert_eq!(turned, p);
    assert_ne!(p.transformed(&quarter), p);
}

#[test]
fn test_mirror_twice_is_identity() {
    let p = PrefabPattern::from_rows(&["#.~", "^+."], tiles).unwrap();
    for mirror in [
        Transform {
            mirror_x: true,
            ..Transform::IDENTITY
        },
        Transform {
            mirror_y: true,
            ..Transform::IDENTITY
        },
    ] {
        assert_eq!(p.transformed(&mirror).transformed(&mirror), p);
        assert!(mirror.then(&mirror).same_mapping(&Transform::IDENTITY));
    }
}

#[test]
fn test_composition_matches_sequential_application() {
    let p = PrefabPattern::from_rows(&["#.~", "^+."], tiles).unwrap();
    for a in all_transforms() {
        for b in all_transforms() {
            assert_eq!(
                p.transformed(&a).transformed(&b),
                p.transformed(&a.then(&b)),
                "{a:?} then {b:?}"
            );
        }
    }
}

#[test]
fn test_nested_prefab_prerenders_before_transform() {
    let inner = Arc::new(Prefab::single(
        "inner",
        PrefabPattern::from_rows(&["#~", "^+"], tiles).unwrap(),
    ));
    let outer = PrefabPattern::new(
        2,
        1,
        vec![vec![Instruction::Nested(inner)], vec![Instruction::Tile(CellType::Floor)]],
    )
    .unwrap()
    .with_cell_size(2)
    .unwrap();
    let flat = PrefabPattern::from_rows(&["#~..", "^+.."], tiles).unwrap();
    let at = Coord::new(1, 2);

    for transform in all_transforms() {
        let mut factory = CountingFactory::default();
        let mut rng = GameRng::new(5);

        let mut nested = GridCanvas::new(8, 8, 1);
        place_pattern(&mut nested, &mut factory, &outer, at, &transform, &mut rng).unwrap();

        let mut direct = GridCanvas::new(8, 8, 1);
        place_pattern(&mut direct, &mut factory, &flat, at, &transform, &mut rng).unwrap();

        let mut baked = GridCanvas::new(8, 8, 1);
        let turned = flat.transformed(&transform);
        let identity = Transform::IDENTITY;
        place_pattern(&mut baked, &mut factory, &turned, at, &identity, &mut rng).unwrap();

        assert_eq!(rows(&nested), rows(&direct), "{transform:?}");
        assert_eq!(rows(&direct), rows(&baked), "{transform:?}");
    }
}

#[test]
fn test_place_prefab_records_objects_and_connections() {
    let legend = |c: char| match c {
        'o' => vec![Instruction::Tile(CellType::Floor), Instruction::Object("chest".into())],
        'c' => vec![Instruction::Tile(CellType::Floor), Instruction::Connection],
        'f' => vec![Instruction::Tile(CellType::Floor), Instruction::Feature("fountain".into())],
        other => tiles(other),
    };
    let pattern = PrefabPattern::from_rows(&["o.c", "#f#"], legend).unwrap();
    let prefab = Prefab::new("alcove").with_layer(Layer::new(0, pattern));

    let mut canvas = GridCanvas::new(10, 10, 4);
    let mut factory = CountingFactory::default();
    let spec = PlacementSpec::fixed(Transform::rotated(Rotation::R90));
    let mut rng = GameRng::new(1);
    let used = place_prefab(&mut canvas, &mut factory, &prefab, Coord::new(3, 3), &spec, &mut rng)
        .unwrap();

    assert_eq!(used.rotation, Rotation::R90);
    // 3x2 turns into 2x3: the top row becomes the right column
    assert_eq!(canvas.objects()[0].at, Coord::new(4, 3));
    assert_eq!(canvas.connections(), &[Coord::new(4, 5)]);
    assert_eq!(canvas.features()[0].at, Coord::new(3, 4));
    assert_eq!(canvas.tile(Coord::new(3, 3)), Some(CellType::Wall));
    assert!(factory.built.iter().all(|(_, _, floor)| *floor == 4));
}

#[test]
fn test_randomized_placement_is_seeded() {
    let pattern = PrefabPattern::from_rows(&["#..", "~^+"], tiles).unwrap();
    let prefab = Prefab::single("room", pattern);
    let spec = PlacementSpec {
        randomize: true,
        ..PlacementSpec::default()
    };
    let place = |seed| {
        let mut canvas = GridCanvas::new(8, 8, 1);
        let mut factory = CountingFactory::default();
        let mut rng = GameRng::new(seed);
        let t = place_prefab(&mut canvas, &mut factory, &prefab, Coord::new(2, 2), &spec, &mut rng)
            .unwrap();
        (t, canvas.render_ascii())
    };
    assert_eq!(place(8), place(8));
}
