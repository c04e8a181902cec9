//! End-to-end tests of the chainable sequence surface.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use seqtools::{Seq, SeqError, TypeRank, Value};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn chains_evaluate_nothing_until_a_terminal_pulls() {
    init_logging();
    let pulls = Rc::new(Cell::new(0));
    let counted = Rc::clone(&pulls);
    let seq = Seq::from_fn(move || {
        counted.set(counted.get() + 1);
        vec![1, 2, 3, 4]
    });

    let chain = seq.filter(|n| n % 2 == 0).map(|n| n * 10);
    assert_eq!(0, pulls.get());

    assert_eq!(vec![20, 40], chain.to_array());
    assert_eq!(1, pulls.get());

    // Every pass re-reads the source.
    assert_eq!(2, chain.count());
    assert_eq!(2, pulls.get());
}

#[test]
fn chains_stay_live_to_shared_mutation() {
    let source = Rc::new(RefCell::new(vec![1, 2, 3]));
    let doubled = Seq::shared(Rc::clone(&source)).map(|n| n * 2);

    assert_eq!(vec![2, 4, 6], doubled.to_array());
    source.borrow_mut().push(4);
    assert_eq!(vec![2, 4, 6, 8], doubled.to_array());
}

#[test]
fn solidify_decouples_from_upstream() {
    let source = Rc::new(RefCell::new(vec![1, 2, 3]));
    let live = Seq::shared(Rc::clone(&source));
    let frozen = live.solidify();

    source.borrow_mut().push(4);
    assert_eq!(vec![1, 2, 3, 4], live.to_array());
    assert_eq!(vec![1, 2, 3], frozen.to_array());
    assert!(frozen.is_immutable());
}

#[test]
fn lazy_solidify_snapshots_on_first_pass_only() {
    init_logging();
    let pulls = Rc::new(Cell::new(0));
    let counted = Rc::clone(&pulls);
    let seq = Seq::from_fn(move || {
        counted.set(counted.get() + 1);
        vec![1, 2, 3]
    });

    let pinned = seq.lazy_solidify();
    assert_eq!(0, pulls.get());

    assert_eq!(3, pinned.iter().count());
    assert_eq!(vec![1, 2, 3], pinned.to_array());
    assert_eq!(1, pulls.get());
}

#[test]
fn filter_map_fold_pipeline() {
    let total = Seq::range(1..10)
        .map(|n| n * 2)
        .filter(|n| *n <= 8)
        .fold(0, |sum, n| sum + n);
    assert_eq!(20, total);
}

#[test]
fn filter_partitions_the_count() {
    let seq = Seq::of((0..17).collect::<Vec<i32>>());
    let evens = seq.filter(|n| n % 2 == 0).count();
    let odds = seq.filter(|n| n % 2 != 0).count();
    assert_eq!(seq.count(), evens + odds);
}

#[test]
fn mapping_twice_fuses() {
    let seq = Seq::of(vec![1, 2, 3]);
    let staged = seq.map(|n| n + 1).map(|n| n * 10).to_array();
    let fused = seq.map(|n| (n + 1) * 10).to_array();
    assert_eq!(fused, staged);
}

#[test]
fn take_and_concat_counts() {
    let seq = Seq::of(vec![1, 2, 3]);
    assert_eq!(2, seq.take(2).count());
    assert_eq!(3, seq.take(9).count());
    assert_eq!(5, seq.concat(&Seq::of(vec![4, 5])).count());
}

#[test]
fn flat_map_flattens_in_order() {
    let out = Seq::of(vec![1, 2, 3])
        .flat_map(|n| vec![n; n as usize])
        .to_array();
    assert_eq!(vec![1, 2, 2, 3, 3, 3], out);
}

#[test]
fn take_and_skip_from_either_end() {
    let seq = Seq::of(vec![1, 2, 3, 4, 5]);
    assert_eq!(vec![1, 2], seq.take(2).to_array());
    assert_eq!(vec![4, 5], seq.take(-2).to_array());
    assert_eq!(vec![3, 4, 5], seq.skip(2).to_array());
    assert_eq!(vec![1, 2, 3], seq.skip(-2).to_array());
    assert!(seq.take(0).to_array().is_empty());
    assert_eq!(vec![1, 2, 3, 4, 5], seq.skip(0).to_array());
}

#[test]
fn take_while_and_skip_while_split_at_first_failure() {
    let seq = Seq::of(vec![1, 2, 9, 1, 2]);
    assert_eq!(vec![1, 2], seq.take_while(|n| *n < 5).to_array());
    assert_eq!(vec![9, 1, 2], seq.skip_while(|n| *n < 5).to_array());
}

#[test]
fn sparse_take_and_skip_partition_the_sequence() {
    let seq = Seq::of((0..10).collect::<Vec<i32>>());
    assert_eq!(vec![0, 3, 6], seq.take_sparse(3).to_array());
    assert_eq!(vec![1, 2, 4, 5, 7, 8, 9], seq.skip_sparse(3).to_array());
}

#[test]
fn reverse_is_an_involution() {
    let seq = Seq::of(vec![1, 2, 3]);
    assert_eq!(vec![3, 2, 1], seq.reverse().to_array());
    assert_eq!(seq.to_array(), seq.reverse().reverse().to_array());
}

#[test]
fn sort_is_stable_and_leaves_the_source_alone() {
    let seq = Seq::of(vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')]);
    let by_num = seq.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')], by_num.to_array());
    // The upstream handle is untouched.
    assert_eq!(vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')], seq.to_array());
}

#[test]
fn sort_yields_a_sorted_permutation() {
    let seq = Seq::of(vec![9, 1, 8, 1, 7, 3]);
    let out = seq.sort().to_array();
    assert!(out.windows(2).all(|pair| pair[0] <= pair[1]));
    let mut expected = seq.to_array();
    expected.sort_unstable();
    assert_eq!(expected, out);
}

#[test]
fn order_by_then_by_scenario() {
    let people = Seq::of(vec![
        ("ana", 31),
        ("bo", 25),
        ("cy", 31),
        ("di", 25),
    ]);
    let out = people
        .order_by_descending(|p: &(&str, i32)| p.1)
        .then_by(|p| p.0)
        .map(|p| p.0)
        .to_array();
    assert_eq!(vec!["ana", "cy", "bo", "di"], out);
}

#[test]
fn distinct_keeps_first_seen_order() {
    let seq = Seq::of(vec![5, 3, 5, 1, 3, 2]);
    assert_eq!(vec![5, 3, 1, 2], seq.distinct().to_array());

    let words = Seq::of(vec!["apple", "avocado", "banana", "cherry"]);
    let by_initial = words.distinct_by(|w: &&str| w.as_bytes()[0]).to_array();
    assert_eq!(vec!["apple", "banana", "cherry"], by_initial);
}

#[test]
fn concat_merge_and_zip() {
    let a = Seq::of(vec![1, 3]);
    let b = Seq::of(vec![2, 4, 6]);

    assert_eq!(vec![1, 3, 2, 4, 6], a.concat(&b).to_array());
    assert_eq!(vec![1, 2, 3, 4, 6], a.merge(&b).to_array());

    let zipped = a.zip(&b).to_array();
    assert_eq!(vec![(1, 2), (3, 4)], zipped);
}

#[test]
fn set_algebra_over_chains() {
    let a = Seq::of(vec![1, 2, 3, 4]);
    let b = Seq::of(vec![3, 4, 5]);

    assert_eq!(vec![3, 4], a.intersect(&b).to_array());
    assert_eq!(vec![1, 2, 3, 4, 5], a.union_with(&b).to_array());
    assert_eq!(vec![1, 2], a.without(&b).to_array());
}

#[test]
fn shuffle_permutes_without_mutating_upstream() {
    let seq = Seq::of((0..50).collect::<Vec<i32>>());
    let shuffled = seq.shuffle();

    let mut out = shuffled.to_array();
    out.sort_unstable();
    assert_eq!((0..50).collect::<Vec<_>>(), out);
    assert_eq!((0..50).collect::<Vec<_>>(), seq.to_array());
}

#[test]
fn random_sampling_counts() {
    let seq = Seq::of((0..20).collect::<Vec<i32>>());
    assert_eq!(5, seq.take_random(5).count());
    assert_eq!(15, seq.skip_random(5).count());
    assert_eq!(0, seq.skip_random(99).count());

    let survivors = seq.skip_random(5).to_array();
    assert!(survivors.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn repeat_replays_whole_passes() {
    let seq = Seq::of(vec![1, 2]);
    assert_eq!(vec![1, 2, 1, 2, 1, 2], seq.repeat(3).to_array());
    assert!(seq.repeat(0).to_array().is_empty());
    assert_eq!(vec![1, 2, 1, 2], seq.repeat(-2).to_array());
}

#[test]
fn insert_clamps_and_remove_deletes_a_count() {
    let seq = Seq::of(vec![1, 2, 3, 4, 5]);
    assert_eq!(vec![1, 9, 2, 3, 4, 5], seq.insert(1, 9).to_array());
    assert_eq!(vec![1, 2, 3, 4, 5, 9], seq.insert(42, 9).to_array());
    assert_eq!(
        vec![1, 8, 9, 2, 3, 4, 5],
        seq.insert_all(1, [8, 9]).to_array()
    );
    assert_eq!(vec![1, 5], seq.remove(1, 3).to_array());
    assert_eq!(vec![1, 2], seq.remove(2, 42).to_array());
}

#[test]
fn group_by_is_insertion_ordered() {
    let seq = Seq::of(vec![1, 4, 2, 5, 3, 6]);
    let grouped = seq.group_by(|n| n % 3).to_array();
    assert_eq!(
        vec![(1, vec![1, 4]), (2, vec![2, 5]), (0, vec![3, 6])],
        grouped
    );

    let lengths = seq
        .group_by_values(|n| n % 3, |n| n * 10)
        .map(|(key, bucket)| (key, bucket.len()))
        .to_array();
    assert_eq!(vec![(1, 2), (2, 2), (0, 2)], lengths);
}

#[test]
fn joins_pair_by_key_or_predicate() {
    let owners = Seq::of(vec![(1, "ana"), (2, "bo")]);
    let pets = Seq::of(vec![(1, "cat"), (1, "dog"), (3, "eel")]);

    let grouped = owners
        .group_join(&pets, |o| o.0, |p| p.0)
        .map(|(owner, pets)| (owner.1, pets.len()))
        .to_array();
    assert_eq!(vec![("ana", 2), ("bo", 0)], grouped);

    let flat = owners
        .join(&pets, |o| o.0, |p| p.0)
        .map(|(owner, pet)| (owner.1, pet.1))
        .to_array();
    assert_eq!(vec![("ana", "cat"), ("ana", "dog")], flat);

    let by_pred = Seq::of(vec![1, 2, 3])
        .join_by(&Seq::of(vec![10, 20]), |l, r| r / l == 10)
        .to_array();
    assert_eq!(vec![(1, 10), (2, 20)], by_pred);
}

#[test]
fn terminal_accessors() {
    let seq = Seq::of(vec![10, 20, 30]);
    assert_eq!(3, seq.count());
    assert_eq!(Some(10), seq.first());
    assert_eq!(Some(30), seq.last());
    assert_eq!(Some(20), seq.nth(1));
    assert_eq!(None, seq.nth(9));
    assert_eq!(Some(10), seq.min());
    assert_eq!(Some(30), seq.max());
    assert!(seq.contains(&20));
    assert!(!seq.contains(&21));
    assert!(seq.every(|n| *n > 0));
    assert!(seq.any(|n| *n == 30));
    assert!(Seq::<i32>::empty().every(|_| false));
}

#[test]
fn reduce_and_single_report_cardinality_errors() {
    let empty = Seq::<i32>::empty();
    assert_eq!(Err(SeqError::EmptyReduction), empty.reduce(|a, b| a + b));
    assert_eq!(-1, empty.fold(-1, |a, b| a + b));
    assert_eq!(Err(SeqError::EmptySequence), empty.single());
    assert_eq!(Err(SeqError::EmptySequence), empty.random());

    let pair = Seq::of(vec![1, 2]);
    assert_eq!(Err(SeqError::Cardinality(2)), pair.single());
    assert_eq!(None, pair.single_opt());

    let one = Seq::of(vec![7]);
    assert_eq!(Ok(7), one.single());
    assert_eq!(Some(7), one.single_opt());
    assert_eq!(Ok(10), Seq::of(vec![1, 2, 3, 4]).reduce(|a, b| a + b));
}

#[test]
fn random_draws_a_contained_element() {
    let seq = Seq::of(vec![1, 2, 3]);
    for _ in 0..10 {
        let drawn = seq.random().unwrap();
        assert!(seq.contains(&drawn));
    }
}

#[test]
fn generated_sequences_are_bounded_by_take() {
    let evens = Seq::generate(|i| i * 2);
    assert_eq!(vec![0, 2, 4, 6], evens.take(4).to_array());
    assert_eq!(vec![0, 2, 4], Seq::generate_n(|i| i * 2, 3).to_array());
    assert_eq!(vec![5, 6, 7], Seq::range(5..8).to_array());
    assert!(Seq::range(8..5).to_array().is_empty());
}

#[test]
fn immutable_views_cache_and_live_views_recompute() {
    let pinned = Seq::of(vec![3, 1, 2]).map(|n| n * 2).lazy_solidify();
    let first = pinned.as_array();
    let second = pinned.as_array();
    assert!(Rc::ptr_eq(&first, &second));

    let source = Rc::new(RefCell::new(vec![1]));
    let live = Seq::shared(Rc::clone(&source));
    assert_eq!(1, live.as_array().len());
    source.borrow_mut().push(2);
    assert_eq!(2, live.as_array().len());
}

#[test]
fn array_view_is_zero_copy_over_a_solid_base() {
    let seq = Seq::of(vec![1, 2, 3]);
    let view = seq.as_array();
    let again = seq.as_array();
    assert!(Rc::ptr_eq(&view, &again));
    assert_eq!(vec![1, 2, 3], seq.into_array());
}

#[test]
fn set_and_map_views() {
    let seq = Seq::of(vec![1, 2, 2, 3]);
    let set = seq.as_set();
    assert_eq!(3, set.len());
    assert!(set.contains(&2));
    assert_eq!(3, seq.into_set().len());

    // Later pairs win duplicate keys.
    let pairs = Seq::of(vec![("a", 1), ("b", 2), ("a", 3)]);
    let map: FxHashMap<&str, i32> = pairs.to_map();
    assert_eq!(Some(&3), map.get("a"));
    assert_eq!(2, map.len());
    assert_eq!(map, *pairs.as_map());
}

#[test]
fn sequence_eq_compares_elements_and_length() {
    let a = Seq::of(vec![1, 2, 3]);
    assert!(a.sequence_eq(&Seq::of(vec![1, 2, 3])));
    assert!(!a.sequence_eq(&Seq::of(vec![1, 2])));
    assert!(!a.sequence_eq(&Seq::of(vec![1, 2, 4])));
    assert!(a.sequence_eq(&a.map(|n| n)));
}

#[test]
fn labels_expose_the_chain_outermost_first() {
    let seq = Seq::of(vec![1, 2, 3]).filter(|n| *n > 1).map(|n| n * 2);
    assert_eq!(vec!["map", "filter", "array"], seq.labels());
    assert_eq!("Seq(map <- filter <- array)", format!("{:?}", seq));
}

#[test]
fn heterogeneous_values_sort_by_type_rank() {
    let mixed = Seq::of(vec![
        Value::Text("b".into()),
        Value::Number(2.0),
        Value::Null,
        Value::Bool(true),
        Value::Undefined,
        Value::Number(1.0),
    ]);
    let ranks: Vec<TypeRank> = mixed.sort().map(|v| v.rank()).to_array();
    assert_eq!(
        vec![
            TypeRank::Bool,
            TypeRank::Number,
            TypeRank::Number,
            TypeRank::Text,
            TypeRank::Null,
            TypeRank::Undefined,
        ],
        ranks
    );

    let numbers: Vec<f64> = mixed
        .narrow(|v: &Value| v.is_numeric())
        .sort()
        .map(|v| match v {
            Value::Number(n) => n,
            _ => unreachable!(),
        })
        .to_array();
    assert_eq!(vec![1.0, 2.0], numbers);
}
