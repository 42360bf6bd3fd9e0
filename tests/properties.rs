// Randomized workloads checked against the scheduler's timeline guarantees

use mlfq_model::{
    MlfqCore, ProcessSpec, SchedEvent, Workload,
    core::{ProcessId, QueueSnapshot, Ticks},
};
use rand::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

struct Case {
    workload: Workload,
    quanta: Vec<Ticks>,
    threshold: Ticks,
}

fn random_case(seed: u64) -> Case {
    let mut rng = StdRng::seed_from_u64(seed);
    let count = rng.random_range(0..=8u64);
    let specs = (1..=count).map(|id| ProcessSpec::new(id, rng.random_range(1..=15)));
    let workload = Workload::from_specs(specs.collect::<Vec<_>>()).unwrap();

    let levels = rng.random_range(1..=4);
    let quanta = (0..levels).map(|_| rng.random_range(1..=6)).collect();
    let threshold = rng.random_range(1..=10);

    Case {
        workload,
        quanta,
        threshold,
    }
}

fn run(case: &Case) -> (Vec<QueueSnapshot>, Vec<SchedEvent>) {
    let mut core = MlfqCore::new(
        case.workload.instantiate().unwrap(),
        case.quanta.clone(),
        case.threshold,
    )
    .unwrap();
    let mut snapshots = vec![core.initial_snapshot()];
    let events = core.run_to_completion().unwrap();
    snapshots.extend(events.iter().filter_map(|e| match e {
        SchedEvent::Snapshot(s) => Some(s.clone()),
        _ => None,
    }));
    (snapshots, events)
}

#[test]
fn timelines_hold_for_random_workloads() {
    for seed in 0..200 {
        let case = random_case(seed);
        let (snapshots, events) = run(&case);
        let bursts: FxHashMap<ProcessId, Ticks> =
            case.workload.iter().map(|s| (s.id, s.burst_time)).collect();

        // Exactly one termination, at the end
        let dones = events.iter().filter(|e| matches!(e, SchedEvent::Done)).count();
        assert_eq!(dones, 1, "seed {seed}");
        assert!(matches!(events.last(), Some(SchedEvent::Done)));

        let gantt: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SchedEvent::Gantt(g) => Some(*g),
                _ => None,
            })
            .collect();

        // Intervals tile the timeline in order without overlap
        let mut cursor = 0;
        for g in &gantt {
            assert!(g.start >= cursor && g.end > g.start, "seed {seed}: {g:?}");
            assert!(g.level < case.quanta.len());
            assert!(g.duration() <= case.quanta[g.level], "seed {seed}: {g:?}");
            cursor = g.end;
        }

        // Every process gets exactly its burst
        let mut cpu: FxHashMap<ProcessId, Ticks> = FxHashMap::default();
        for g in &gantt {
            *cpu.entry(g.process_id).or_default() += g.duration();
        }
        assert_eq!(cpu, bursts, "seed {seed}");

        let total: Ticks = bursts.values().sum();
        let mut finished: FxHashSet<ProcessId> = FxHashSet::default();
        let mut consumed: FxHashMap<ProcessId, Ticks> = FxHashMap::default();
        let mut gantt_iter = gantt.iter().peekable();

        for snap in &snapshots {
            // Close out everything that ended by this snapshot
            while let Some(g) = gantt_iter.next_if(|g| g.end <= snap.time) {
                let used = consumed.entry(g.process_id).or_default();
                *used += g.duration();
                if *used == bursts[&g.process_id] {
                    finished.insert(g.process_id);
                }
            }

            let entries: Vec<_> = snap.levels.iter().flat_map(|l| l.entries.iter()).collect();
            assert!(entries.iter().filter(|e| e.running).count() <= 1, "seed {seed}");

            let mut seen = FxHashSet::default();
            for e in &entries {
                assert!(seen.insert(e.id), "seed {seed}: P{} listed twice", e.id);
                assert!(!finished.contains(&e.id), "seed {seed}: P{} after finish", e.id);
            }

            for level in snap.levels.iter().skip(1) {
                for e in level.entries.iter().filter(|e| !e.running) {
                    assert!(
                        e.wait_time <= case.threshold,
                        "seed {seed}: P{} waited {} at level {} (t={})",
                        e.id,
                        e.wait_time,
                        level.level,
                        snap.time
                    );
                }
            }

            // Remaining work plus CPU handed out so far is constant
            let remaining: Ticks = entries.iter().map(|e| e.remaining_burst).sum();
            let executed = snap.time;
            assert_eq!(remaining + executed, total, "seed {seed} t={}", snap.time);
        }
    }
}

#[test]
fn first_dispatches_follow_admission_order() {
    for seed in 0..100 {
        let case = random_case(seed);
        let (_, events) = run(&case);

        let mut seen = FxHashSet::default();
        let mut first_dispatch = Vec::new();
        for event in &events {
            if let SchedEvent::Gantt(g) = event {
                if seen.insert(g.process_id) {
                    assert_eq!(g.level, 0, "seed {seed}: first run of P{} off level 0", g.process_id);
                    first_dispatch.push(g.process_id);
                }
            }
        }

        let admitted: Vec<ProcessId> = case.workload.iter().map(|s| s.id).collect();
        assert_eq!(first_dispatch, admitted, "seed {seed}");
    }
}
