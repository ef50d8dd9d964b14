use facelabel_core::{RandomSource, Status, StatusDebouncer};

/// Label statistics gathered by [`sample`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelStats {
    pub evaluations: u64,
    pub real: u64,
    /// Label changes summed over all identities.
    pub changes: u64,
    /// Shortest run between two changes of the same identity, in frames.
    pub shortest_run: Option<u64>,
}

impl LabelStats {
    pub fn real_fraction(&self) -> f64 {
        if self.evaluations == 0 {
            return 0.0;
        }
        self.real as f64 / self.evaluations as f64
    }
}

/// Evaluate `faces` identities for `frames` frames, in detection order.
pub fn sample<R: RandomSource>(
    debouncer: &mut StatusDebouncer<R>,
    frames: u64,
    faces: usize,
) -> LabelStats {
    let mut stats = LabelStats::default();
    let mut last: Vec<Option<Status>> = vec![None; faces];
    let mut run = vec![0u64; faces];

    for _ in 0..frames {
        debouncer.begin_frame();
        for id in 0..faces {
            let status = debouncer.evaluate(Some(id));
            stats.evaluations += 1;
            if status.is_real() {
                stats.real += 1;
            }
            match last[id] {
                Some(prev) if prev != status => {
                    stats.changes += 1;
                    let finished = run[id];
                    stats.shortest_run =
                        Some(stats.shortest_run.map_or(finished, |s| s.min(finished)));
                    run[id] = 1;
                }
                _ => run[id] += 1,
            }
            last[id] = Some(status);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use facelabel_core::Policy;

    #[test]
    fn test_shared_cooldown_runs_are_long() {
        let mut debouncer = StatusDebouncer::with_seed(Policy::SharedCooldown, Some(21));
        let stats = sample(&mut debouncer, 100_000, 1);
        assert_eq!(stats.evaluations, 100_000);
        assert!(stats.changes > 0);
        assert!(stats.shortest_run.unwrap() >= 200);
        assert!((stats.real_fraction() - 0.8).abs() < 0.1);
    }

    #[test]
    fn test_flip_counts_every_identity() {
        let mut debouncer = StatusDebouncer::with_seed(Policy::Flip, Some(21));
        let stats = sample(&mut debouncer, 10_000, 3);
        assert_eq!(stats.evaluations, 30_000);
        assert_eq!(debouncer.tracked(), 3);
        assert!(stats.changes > 0);
    }

    #[test]
    fn test_no_frames() {
        let mut debouncer = StatusDebouncer::with_seed(Policy::Flip, Some(1));
        let stats = sample(&mut debouncer, 0, 2);
        assert_eq!(stats, LabelStats::default());
        assert_eq!(stats.real_fraction(), 0.0);
    }
}
