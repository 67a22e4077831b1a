use super::*;

use proptest::prelude::*;
use std::collections::BTreeSet;

use crate::arena::NodeId;
use crate::marker::decode_number;

fn is_substring(hay: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || hay.windows(needle.len()).any(|w| w == needle)
}

/// Indices of the keys containing `q`, as a brute-force reference.
fn model_search(keys: &[Vec<u8>], q: &[u8]) -> Vec<u32> {
    if q.is_empty() {
        return Vec::new();
    }
    keys.iter()
        .enumerate()
        .filter(|(_, k)| is_substring(k, q))
        .map(|(i, _)| i as u32 + 1)
        .collect()
}

/// Longest prefix of `q` occurring anywhere in `keys`.
fn model_match_len(keys: &[Vec<u8>], q: &[u8]) -> usize {
    (0..=q.len())
        .rev()
        .find(|&l| l == 0 || keys.iter().any(|k| is_substring(k, &q[..l])))
        .unwrap_or(0)
}

/// Indices of the keys in which `w` starts at 1-based `pos`.
fn model_locate(keys: &[Vec<u8>], w: &[u8], pos: usize) -> Vec<u32> {
    if w.is_empty() || pos == 0 {
        return Vec::new();
    }
    keys.iter()
        .enumerate()
        .filter(|(_, k)| pos - 1 < k.len() && k[pos - 1..].starts_with(w))
        .map(|(i, _)| i as u32 + 1)
        .collect()
}

fn build(keys: &[Vec<u8>]) -> SuffixTree {
    let mut t = SuffixTree::new();
    for (i, k) in keys.iter().enumerate() {
        let idx = i as u32 + 1;
        t.insert(k, idx).unwrap();
        t.index_positions(k, idx).unwrap();
    }
    t
}

fn validate_tree(t: &SuffixTree) {
    let a = t.arena();
    let mut seen = BTreeSet::new();
    for id in a.subtree(NodeId::ROOT) {
        assert!(seen.insert(id), "node reachable twice: {id:?}");
        let node = &a[id];
        for (&first, edge) in &node.edges {
            assert!(!edge.label.is_empty(), "empty edge label");
            assert_eq!(edge.label[0], first, "edge key must be its first symbol");
        }
        assert!(
            node.indices.windows(2).all(|w| w[0] < w[1]),
            "indices must be strictly ascending"
        );
    }
    assert_eq!(seen.len(), a.len(), "every allocated node must be reachable");
}

fn keys_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    // A three-symbol alphabet gives plenty of repeated substrings.
    prop::collection::vec(prop::collection::vec(b'0'..=b'2', 0..=10), 1..=8)
}

fn query_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(b'0'..=b'2', 1..=6)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_containment(keys in keys_strategy()) {
        let t = build(&keys);
        validate_tree(&t);
        for (i, k) in keys.iter().enumerate() {
            let idx = i as u32 + 1;
            for start in 0..k.len() {
                for end in start + 1..=k.len() {
                    prop_assert!(t.search(&k[start..end], None).contains(&idx));
                }
            }
        }
    }

    #[test]
    fn prop_search_matches_model(keys in keys_strategy(), queries in prop::collection::vec(query_strategy(), 1..=16)) {
        let t = build(&keys);
        for q in &queries {
            let got = t.search(q, None);
            prop_assert_eq!(&got, &model_search(&keys, q));

            let counted = t.search_with_count(q, None);
            prop_assert_eq!(counted.total, got.len());
            prop_assert_eq!(counted.results, got);
        }
        prop_assert_eq!(t.compute_count(), keys.iter().filter(|k| !k.is_empty()).count());
    }

    #[test]
    fn prop_position_accuracy(keys in keys_strategy(), queries in prop::collection::vec(query_strategy(), 1..=16)) {
        let t = build(&keys);
        for (i, k) in keys.iter().enumerate() {
            let idx = i as u32 + 1;
            for o in 0..k.len() {
                prop_assert!(t.locate(&k[o..], o + 1).contains(&idx));
            }
        }

        // Nothing beyond the exact occurrences, for substrings and random words.
        let words = keys
            .iter()
            .flat_map(|k| (0..k.len()).flat_map(move |s| (s + 1..=k.len()).map(move |e| k[s..e].to_vec())))
            .chain(queries.iter().cloned());
        for w in words {
            for pos in 0..=11 {
                prop_assert_eq!(t.locate(&w, pos), model_locate(&keys, &w, pos), "word {:?} at {}", w, pos);
            }
        }
    }

    #[test]
    fn prop_encrypted_positions_match_model(
        keys in keys_strategy(),
        queries in prop::collection::vec(query_strategy(), 1..=16),
        secret in prop::collection::vec(any::<u8>(), 16)
    ) {
        let cipher = XorKeystream::new(secret).unwrap();
        let t = build(&keys).encrypt(&cipher).unwrap();
        let mut oracle = LocalOracle::new();

        for q in &queries {
            let m = model_match_len(&keys, q);
            for pos in 1..=11 {
                let hits = t.encrypted_search(q, pos, &cipher, &mut oracle).unwrap();
                prop_assert!(hits.iter().all(|h| h.matched_len == m));
                let mut got: Vec<u32> = hits
                    .iter()
                    .map(|h| decode_number(&cipher.apply(&h.sequence).unwrap()).unwrap())
                    .collect();
                got.sort_unstable();
                prop_assert_eq!(got, model_locate(&keys, &q[..m], pos), "query {:?} at {}", q, pos);
            }
        }
    }

    #[test]
    fn prop_encryption_transparency(
        keys in keys_strategy(),
        queries in prop::collection::vec(query_strategy(), 1..=16),
        secret in prop::collection::vec(any::<u8>(), 16)
    ) {
        let cipher = XorKeystream::new(secret).unwrap();
        let t = build(&keys).encrypt(&cipher).unwrap();
        let mut oracle = LocalOracle::new();

        for (i, k) in keys.iter().enumerate() {
            let idx = i as u32 + 1;
            for o in 0..k.len() {
                let hits = t.encrypted_search(&k[o..], o + 1, &cipher, &mut oracle).unwrap();
                let found = hits.iter().any(|h| {
                    let seq = decode_number::<u32>(&cipher.apply(&h.sequence).unwrap());
                    seq == Some(idx) && h.matched_len == k.len() - o
                });
                prop_assert!(found, "key {} offset {} not found", idx, o + 1);
            }
        }

        for q in &queries {
            let got = t.encrypted_search_node(q, &cipher, &mut oracle).unwrap();
            let expected = model_match_len(&keys, q);
            prop_assert_eq!(got.map_or(0, |(_, m)| m), expected);
        }
    }
}

#[test]
fn single_symbol_mutation_shortens_match() {
    let keys = vec![b"000110010".to_vec(), b"100011100".to_vec(), b"010110011".to_vec()];
    let cipher = XorKeystream::new(b"1011001110001011".to_vec()).unwrap();
    let t = build(&keys).encrypt(&cipher).unwrap();
    let mut oracle = LocalOracle::new();

    for k in &keys {
        for pos in 0..k.len() {
            let mut q = k.clone();
            q[pos] = if q[pos] == b'0' { b'1' } else { b'0' };
            let (_, matched) = t
                .encrypted_search_node(&q, &cipher, &mut oracle)
                .unwrap()
                .expect("the first symbol always occurs");
            assert_eq!(matched, model_match_len(&keys, &q));
            assert!(matched >= pos);
        }
    }
}
