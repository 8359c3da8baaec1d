use courier_core::{classify, find_path, LiveSampler, RoadColorRange, SearchOptions, Surface, Tile, Traversability};
use image::{Rgba, RgbaImage};

fn painted(w: u32, h: u32, pitch: u32, blocked: &[(u32, u32)]) -> Surface {
    let mut img = RgbaImage::from_pixel(w * pitch, h * pitch, Rgba([100, 110, 140, 255]));
    for &(tx, ty) in blocked {
        for py in 0..pitch {
            for px in 0..pitch {
                img.put_pixel(tx * pitch + px, ty * pitch + py, Rgba([200, 30, 30, 255]));
            }
        }
    }
    Surface::new(img, pitch).unwrap()
}

#[test]
fn three_by_three_over_sampled_surface() {
    let s = painted(3, 3, 7, &[(2, 0), (0, 2)]);
    let grid = classify(&s, RoadColorRange::default());
    assert_eq!(grid.roads().len(), 7);
    assert_eq!(grid.non_roads().len(), 2);

    let live = LiveSampler::new(&s, s.pitch(), RoadColorRange::default());
    for map in [&live as &dyn Traversability, &grid as &dyn Traversability] {
        let res = find_path(Tile::new(0, 0), Tile::new(2, 2), map, &SearchOptions::default());
        let path = res.path.expect("path");
        assert_eq!(path.len(), 3);
        for t in &path {
            assert!(grid.roads().contains(t));
        }
        assert!(!path.contains(&Tile::new(2, 2)));
    }
}

#[test]
fn search_never_leaves_the_surface() {
    // every tile off the surface is unreadable, so an open 2x1 map cannot reach (5,0)
    let s = painted(2, 1, 5, &[]);
    let live = LiveSampler::new(&s, s.pitch(), RoadColorRange::default());
    let res = find_path(Tile::new(0, 0), Tile::new(5, 0), &live, &SearchOptions::default());
    assert!(res.path.is_none());
    assert_eq!(res.expanded, 2);
}

#[test]
fn custom_colour_band_changes_the_partition() {
    let s = painted(2, 2, 3, &[(1, 1)]);
    let strict = RoadColorRange { min: 120, max: 150 };
    let grid = classify(&s, strict);
    // road pixels have a red channel of 100, outside the strict band
    assert!(grid.roads().is_empty());
    assert_eq!(grid.non_roads().len(), 4);
}
