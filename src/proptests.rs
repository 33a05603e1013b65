use crate::io::{self, Handler, ImageTree, Io, Span, Timestamp};
use crate::trie::TrieMap;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// TrieMap: model-based equivalence against BTreeMap
// =============================================================================

#[derive(Clone, Debug)]
enum Op {
    Set(u64, u64),
    Remove(u64),
    Get(u64),
}

fn key_strategy() -> impl Strategy<Value = u64> + Clone {
    // Mostly small keys so paths collide and sharing is exercised; a few
    // full-width keys to cover 64-level descents.
    prop_oneof![
        4 => 0u64..64,
        2 => 0u64..4096,
        1 => any::<u64>(),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Set(k, v)),
        25 => key.clone().prop_map(Op::Remove),
        25 => key.prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=500)
}

fn entries(t: &TrieMap<u64>) -> Vec<(u64, u64)> {
    let mut got: Vec<(u64, u64)> = t.iter().map(|(k, v)| (k, *v)).collect();
    got.sort_unstable();
    got
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: TrieMap<u64> = TrieMap::new();
        let mut m: BTreeMap<u64, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Set(key, value) => {
                    t = t.set(key, value);
                    m.insert(key, value);
                }
                Op::Remove(key) => {
                    t = t.remove(key);
                    m.remove(&key);
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(key), m.get(&key));
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        let expected: Vec<(u64, u64)> = m.into_iter().collect();
        prop_assert_eq!(entries(&t), expected);
    }

    #[test]
    fn prop_snapshots_persist(ops in ops_strategy()) {
        let mut t: TrieMap<u64> = TrieMap::new();
        let mut m: BTreeMap<u64, u64> = BTreeMap::new();
        let mut snapshots: Vec<(TrieMap<u64>, Vec<(u64, u64)>)> = Vec::new();

        for (i, op) in ops.into_iter().enumerate() {
            match op {
                Op::Set(key, value) => {
                    t = t.set(key, value);
                    m.insert(key, value);
                }
                Op::Remove(key) => {
                    t = t.remove(key);
                    m.remove(&key);
                }
                Op::Get(_) => {}
            }
            if i % 16 == 0 {
                snapshots.push((t.clone(), m.iter().map(|(k, v)| (*k, *v)).collect()));
            }
        }

        // Later writes must not have disturbed any earlier version.
        for (snap, expected) in snapshots {
            prop_assert_eq!(entries(&snap), expected);
        }
    }

    #[test]
    fn prop_unrelated_keys_survive_write(
        base in prop::collection::btree_map(key_strategy(), any::<u64>(), 0..64),
        key in key_strategy(),
        value in any::<u64>(),
    ) {
        let t: TrieMap<u64> = base.iter().map(|(k, v)| (*k, *v)).collect();
        let t2 = t.set(key, value);

        prop_assert_eq!(t2.get(key), Some(&value));
        for (k, v) in &base {
            if *k != key {
                prop_assert_eq!(t2.get(*k), Some(v));
            }
            // The pre-write version never observes the write.
            prop_assert_eq!(t.get(*k), Some(v));
        }
    }
}

// =============================================================================
// Io: deterministic traces and the bind laws
// =============================================================================

#[derive(Clone, Debug, Arbitrary)]
enum Step {
    Print(String),
    Input,
    Write(String, Vec<u8>),
    Read(String),
    Time,
    Sleep(u64),
    Draw,
}

/// Deterministic handler: the same scripted requests always produce the
/// same outcomes and the same trace.
#[derive(Default)]
struct TraceHandler {
    trace: Vec<String>,
    files: HashMap<String, Vec<u8>>,
    line_count: u64,
    clock: u64,
}

impl Handler for TraceHandler {
    fn put_text(&mut self, text: &str) {
        self.trace.push(format!("put:{text}"));
    }

    fn get_text(&mut self) -> String {
        self.line_count += 1;
        let line = format!("line-{}", self.line_count);
        self.trace.push(format!("get:{line}"));
        line
    }

    fn write_file(&mut self, path: &str, data: &[u8]) {
        self.trace.push(format!("write:{path}:{}", data.len()));
        self.files.insert(path.to_string(), data.to_vec());
    }

    fn read_file(&mut self, path: &str) -> Vec<u8> {
        self.trace.push(format!("read:{path}"));
        self.files
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.as_bytes().to_vec())
    }

    fn get_time(&mut self) -> Timestamp {
        self.clock += 1000;
        self.trace.push(format!("time:{}", self.clock));
        Timestamp::from_u64(self.clock)
    }

    fn sleep(&mut self, duration: Span) {
        self.trace.push(format!("sleep:{}", duration.to_u64()));
    }

    fn draw_image(&mut self, image: &ImageTree) {
        let mut n = 0usize;
        image.for_each_pixel(&mut |_, _, _| n += 1);
        self.trace.push(format!("draw:{n}"));
    }
}

fn build(script: &[Step]) -> Io<u64> {
    let mut prog: Io<u64> = io::pure(0);
    for step in script.iter().cloned() {
        prog = match step {
            Step::Print(text) => prog.bind(move |n| io::print(text).map(move |_| n + 1)),
            Step::Input => prog.bind(|n| io::input().map(move |line| n + line.len() as u64)),
            Step::Write(path, data) => {
                prog.bind(move |n| io::write_file(path, data).map(move |_| n + 1))
            }
            Step::Read(path) => {
                prog.bind(move |n| io::read_file(path).map(move |data| n + data.len() as u64))
            }
            Step::Time => prog.bind(|n| io::now().map(move |t| n ^ t.lo as u64)),
            Step::Sleep(d) => prog.bind(move |n| io::sleep(Span::from_u64(d)).map(move |_| n + 1)),
            Step::Draw => prog.bind(|n| io::draw_image(ImageTree::Leaf).map(move |_| n)),
        };
    }
    prog
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_trace_determinism(script in prop::collection::vec(any::<Step>(), 0..24)) {
        let mut h1 = TraceHandler::default();
        let mut h2 = TraceHandler::default();
        let r1 = build(&script).run(&mut h1);
        let r2 = build(&script).run(&mut h2);
        prop_assert_eq!(r1, r2);
        prop_assert_eq!(h1.trace, h2.trace);
    }

    #[test]
    fn prop_bind_associativity(script in prop::collection::vec(any::<Step>(), 0..24)) {
        let f = |n: u64| io::print(format!("f:{n}")).map(move |_| n + 1);
        let g = |n: u64| io::input().map(move |line| n + line.len() as u64);

        let left = build(&script).bind(f).bind(g);
        let right = build(&script).bind(move |n| f(n).bind(g));

        let mut h1 = TraceHandler::default();
        let mut h2 = TraceHandler::default();
        prop_assert_eq!(left.run(&mut h1), right.run(&mut h2));
        prop_assert_eq!(h1.trace, h2.trace);
    }

    #[test]
    fn prop_bind_left_identity(
        v in any::<u64>(),
        script in prop::collection::vec(any::<Step>(), 0..8),
    ) {
        // pure(v).bind(f) must behave exactly as f(v), requests included.
        let f = {
            let script = script.clone();
            move |n: u64| build(&script).map(move |m| m.wrapping_add(n))
        };
        let h = {
            let script = script;
            move |n: u64| build(&script).map(move |m| m.wrapping_add(n))
        };

        let mut h1 = TraceHandler::default();
        let mut h2 = TraceHandler::default();
        let lhs = io::pure(v).bind(f).run(&mut h1);
        let rhs = h(v).run(&mut h2);
        prop_assert_eq!(lhs, rhs);
        prop_assert_eq!(h1.trace, h2.trace);
    }
}
