use super::*;

use proptest::prelude::*;

use crate::circle::Circle;

#[derive(Clone, Debug)]
enum Op {
    Insert(Circle),
    Remove(usize),
    RemoveRegion(AabbRect<[f64; 2]>),
    Query(AabbRect<[f64; 2]>),
}

fn rect_strategy() -> impl Strategy<Value = AabbRect<[f64; 2]>> + Clone {
    // Whole coordinates, so touching edges and duplicates show up often.
    (0i32..100, 0i32..100, 0i32..40, 0i32..40).prop_map(|(x, y, w, h)| {
        let (x, y) = (x as f64, y as f64);
        AabbRect::new([x, y], [x + w as f64, y + h as f64])
    })
}

fn circle_strategy() -> impl Strategy<Value = Circle> + Clone {
    (0i32..100, 0i32..100, 0i32..6)
        .prop_map(|(x, y, r)| Circle::xyr(x as f64, y as f64, r as f64))
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        60 => circle_strategy().prop_map(Op::Insert),
        10 => any::<usize>().prop_map(Op::Remove),
        10 => rect_strategy().prop_map(Op::RemoveRegion),
        20 => rect_strategy().prop_map(Op::Query),
    ];
    prop::collection::vec(op, 0..=600)
}

fn sorted(circles: impl IntoIterator<Item = Circle>) -> Vec<(f64, f64, f64)> {
    let mut v: Vec<_> = circles
        .into_iter()
        .map(|c| (c.center[0], c.center[1], c.radius))
        .collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_overlap_consistency(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        prop_assert_eq!(a.overlap_area(&b), b.overlap_area(&a));

        if a.overlap_area(&b) > 0. {
            prop_assert!(a.overlaps(&b));
        }

        if a.contains(&b) && b.contains(&a) {
            prop_assert_eq!(a, b);
        }

        let u = a.union(&b);
        prop_assert!(u.contains(&a) && u.contains(&b));
        prop_assert!(u.enlargement(&a) == 0. && u.enlargement(&b) == 0.);
    }

    #[test]
    fn prop_equivalence(
        ops in ops_strategy(),
        capacity in 1usize..200,
        min_child in 1usize..4,
        extra in 0usize..4,
    ) {
        let params = TreeParameter::new(capacity).fanout(min_child, 2 * min_child + extra);
        let mut tree = RTree::new(params).unwrap();

        // Live elements, oldest first.
        let mut model: Vec<(TreeNodeIndex, Circle)> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(circle) => {
                    let inserted = tree.insert(circle).unwrap();
                    model.push((inserted.id, circle));

                    let expected = (model.len() > capacity).then(|| model.remove(0).1);
                    prop_assert_eq!(inserted.evicted, expected);
                }
                Op::Remove(k) => {
                    if model.is_empty() {
                        continue;
                    }

                    let (id, circle) = model.remove(k % model.len());
                    prop_assert_eq!(tree.remove(id), Some(circle));
                    prop_assert_eq!(tree.remove(id), None);
                }
                Op::RemoveRegion(region) => {
                    let removed = tree.remove_region(&region);

                    let (gone, kept): (Vec<_>, Vec<_>) = model
                        .iter()
                        .copied()
                        .partition(|(_, c)| c.bound().overlaps(&region));
                    model = kept;

                    prop_assert_eq!(sorted(removed), sorted(gone.into_iter().map(|x| x.1)));
                }
                Op::Query(region) => {
                    let found = tree.query(&region).into_iter().copied();
                    let expected = model
                        .iter()
                        .map(|x| x.1)
                        .filter(|c| c.bound().overlaps(&region));
                    prop_assert_eq!(sorted(found), sorted(expected));
                }
            }

            prop_assert_eq!(tree.len(), model.len());
            prop_assert!(tree.len() <= capacity);
        }

        tree.__debug_verify_tree_state()
            .map_err(|x| println!("{}", x))
            .unwrap();

        let got: Vec<_> = tree.iter().map(|(id, c)| (id, *c)).collect();
        prop_assert_eq!(got, model);
    }
}
