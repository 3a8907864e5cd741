use std::{
    fmt, io,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EvaluationResult, EvaluationTask, FitnessFunction, TaskError};

/// Executes one generation's evaluation tasks.
///
/// Implementations return results ordered by agent index and only return once
/// every task has finished or one has failed. Tasks carry their own copies of
/// the genome, so no locking of population state is involved.
pub trait WorkerPool {
    /// Number of tasks that may run at the same time.
    fn workers(&self) -> usize;

    fn evaluate<F>(
        &self,
        tasks: Vec<EvaluationTask>,
        fitness: &F,
    ) -> Result<Vec<EvaluationResult>, TaskError>
    where
        F: FitnessFunction + ?Sized;
}

static NICENESS_WARNED: AtomicBool = AtomicBool::new(false);

/// Lowers (or raises) the scheduling priority of the calling thread.
///
/// Best effort: returns whether the priority was changed. Failures such as
/// missing privileges do not stop the caller; the first one in a process is
/// logged as a warning.
pub fn set_niceness(niceness: i32) -> bool {
    #[cfg(unix)]
    {
        // SAFETY: setpriority only reads its integer arguments.
        let ret = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, niceness) };
        if ret != 0 {
            note_niceness_failure(niceness, &io::Error::last_os_error());
        }
        ret == 0
    }
    #[cfg(not(unix))]
    {
        let _ = niceness;
        false
    }
}

/// Logs a failed priority change; returns whether this was the warning.
#[cfg_attr(not(unix), allow(dead_code))]
fn note_niceness_failure(niceness: i32, error: &io::Error) -> bool {
    let first = !NICENESS_WARNED.swap(true, Ordering::Relaxed);
    if first {
        tracing::warn!(niceness, %error, "failed to adjust worker priority");
    } else {
        tracing::trace!(niceness, %error, "failed to adjust worker priority");
    }
    first
}

/// Worker pool implementation to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    #[default]
    Rayon,
    Scoped,
    Sequential,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PoolKind::Rayon => "rayon",
            PoolKind::Scoped => "scoped",
            PoolKind::Sequential => "sequential",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    pub kind: PoolKind,
    /// Worker threads; ignored by the sequential pool.
    pub workers: usize,
    /// Niceness applied to each worker thread, if any.
    pub niceness: Option<i32>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            kind: PoolKind::default(),
            workers: 8,
            niceness: Some(-10),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("failed to build evaluation thread pool: {source}")]
pub struct PoolBuildError {
    pub source: rayon::ThreadPoolBuildError,
}

/// Evaluates tasks on a dedicated fixed-size rayon pool.
#[derive(Debug)]
pub struct RayonPool {
    pool: rayon::ThreadPool,
}

impl RayonPool {
    pub fn new(workers: usize, niceness: Option<i32>) -> Result<Self, PoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("evaluator-{i}"))
            .start_handler(move |_| {
                if let Some(niceness) = niceness {
                    set_niceness(niceness);
                }
            })
            .build()
            .map_err(|source| PoolBuildError { source })?;
        Ok(Self { pool })
    }
}

impl WorkerPool for RayonPool {
    fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn evaluate<F>(
        &self,
        tasks: Vec<EvaluationTask>,
        fitness: &F,
    ) -> Result<Vec<EvaluationResult>, TaskError>
    where
        F: FitnessFunction + ?Sized,
    {
        self.pool.install(|| {
            tasks
                .into_par_iter()
                .map(|task| task.run(fitness))
                .collect()
        })
    }
}

/// Evaluates tasks on scoped threads spawned per generation.
///
/// Workers pull tasks from a shared queue until it is empty or a task fails.
#[derive(Debug, Clone)]
pub struct ScopedPool {
    workers: usize,
    niceness: Option<i32>,
}

impl ScopedPool {
    #[must_use]
    pub fn new(workers: usize, niceness: Option<i32>) -> Self {
        Self {
            workers: workers.max(1),
            niceness,
        }
    }
}

impl WorkerPool for ScopedPool {
    fn workers(&self) -> usize {
        self.workers
    }

    fn evaluate<F>(
        &self,
        tasks: Vec<EvaluationTask>,
        fitness: &F,
    ) -> Result<Vec<EvaluationResult>, TaskError>
    where
        F: FitnessFunction + ?Sized,
    {
        let queue = Mutex::new(tasks.into_iter());
        let failed = AtomicBool::new(false);
        let next_task = || {
            let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
            queue.next()
        };

        let per_worker = thread::scope(|s| {
            let handles = (0..self.workers)
                .map(|_| {
                    s.spawn(|| {
                        if let Some(niceness) = self.niceness {
                            set_niceness(niceness);
                        }
                        let mut results = vec![];
                        while !failed.load(Ordering::Relaxed) {
                            let Some(task) = next_task() else {
                                break;
                            };
                            match task.run(fitness) {
                                Ok(result) => results.push(result),
                                Err(e) => {
                                    failed.store(true, Ordering::Relaxed);
                                    return Err(e);
                                }
                            }
                        }
                        Ok(results)
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect::<Vec<_>>()
        });

        let mut results = vec![];
        for worker_results in per_worker {
            results.extend(worker_results?);
        }
        results.sort_by_key(|r| r.agent_index);
        Ok(results)
    }
}

/// Evaluates tasks one after another on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialPool;

impl WorkerPool for SequentialPool {
    fn workers(&self) -> usize {
        1
    }

    fn evaluate<F>(
        &self,
        tasks: Vec<EvaluationTask>,
        fitness: &F,
    ) -> Result<Vec<EvaluationResult>, TaskError>
    where
        F: FitnessFunction + ?Sized,
    {
        tasks.into_iter().map(|task| task.run(fitness)).collect()
    }
}

/// Pool selected at runtime from a [`PoolConfig`].
#[derive(Debug)]
pub enum Pool {
    Rayon(RayonPool),
    Scoped(ScopedPool),
    Sequential(SequentialPool),
}

impl Pool {
    pub fn new(config: &PoolConfig) -> Result<Self, PoolBuildError> {
        Ok(match config.kind {
            PoolKind::Rayon => Pool::Rayon(RayonPool::new(config.workers, config.niceness)?),
            PoolKind::Scoped => Pool::Scoped(ScopedPool::new(config.workers, config.niceness)),
            PoolKind::Sequential => Pool::Sequential(SequentialPool),
        })
    }
}

impl WorkerPool for Pool {
    fn workers(&self) -> usize {
        match self {
            Pool::Rayon(pool) => pool.workers(),
            Pool::Scoped(pool) => pool.workers(),
            Pool::Sequential(pool) => pool.workers(),
        }
    }

    fn evaluate<F>(
        &self,
        tasks: Vec<EvaluationTask>,
        fitness: &F,
    ) -> Result<Vec<EvaluationResult>, TaskError>
    where
        F: FitnessFunction + ?Sized,
    {
        match self {
            Pool::Rayon(pool) => pool.evaluate(tasks, fitness),
            Pool::Scoped(pool) => pool.evaluate(tasks, fitness),
            Pool::Sequential(pool) => pool.evaluate(tasks, fitness),
        }
    }
}

#[cfg(test)]
mod tests {
    use neuroswing_network::{Activation, Activations, Agent, Genome, Topology};

    use super::*;
    use crate::FitnessError;

    fn tasks(count: usize) -> Vec<EvaluationTask> {
        let topology = Topology::new(vec![1, 1]).unwrap();
        (0..count)
            .map(|agent_index| {
                let weight = f64::from(u32::try_from(agent_index).unwrap());
                EvaluationTask {
                    agent_index,
                    generation: 0,
                    topology: topology.clone(),
                    genome: Genome::new(vec![weight], vec![0.0]),
                    activations: Activations::uniform(Activation::Relu),
                }
            })
            .collect()
    }

    fn weight_times_ticks(agent: &mut Agent) -> Result<f64, FitnessError> {
        let ticks = agent.genome().weights[0] as u64 % 5 + 1;
        let mut score = 0.0;
        while agent.ticks() < ticks {
            score += agent.run(&[1.0])?[0];
        }
        Ok(score)
    }

    fn fails_on_agent_3(agent: &mut Agent) -> Result<f64, FitnessError> {
        if agent.genome().weights[0] == 3.0 {
            return Err("agent 3 exploded".into());
        }
        Ok(0.0)
    }

    fn pools() -> Vec<Pool> {
        vec![
            Pool::new(&PoolConfig {
                kind: PoolKind::Rayon,
                workers: 3,
                niceness: None,
            })
            .unwrap(),
            Pool::new(&PoolConfig {
                kind: PoolKind::Scoped,
                workers: 3,
                niceness: Some(5),
            })
            .unwrap(),
            Pool::new(&PoolConfig {
                kind: PoolKind::Sequential,
                ..PoolConfig::default()
            })
            .unwrap(),
        ]
    }

    #[test]
    fn test_results_in_agent_order() {
        for pool in pools() {
            let results = pool.evaluate(tasks(17), &weight_times_ticks).unwrap();
            assert_eq!(results.len(), 17);
            for (i, result) in results.iter().enumerate() {
                assert_eq!(result.agent_index, i);
                let ticks = i as u64 % 5 + 1;
                assert_eq!(result.ticks, ticks);
                assert!((result.score - i as f64 * ticks as f64).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_task_error_is_returned() {
        for pool in pools() {
            let err = pool.evaluate(tasks(8), &fails_on_agent_3).unwrap_err();
            assert_eq!(err.agent_index, 3);
        }
    }

    #[test]
    fn test_worker_counts() {
        let counts = pools().iter().map(WorkerPool::workers).collect::<Vec<_>>();
        assert_eq!(counts, vec![3, 3, 1]);
    }

    #[test]
    fn test_raising_niceness_succeeds() {
        // any thread may lower its own priority
        let changed = thread::spawn(|| set_niceness(5)).join().unwrap();
        assert_eq!(changed, cfg!(unix));
    }

    #[test]
    fn test_niceness_failure_warns_once() {
        let error = io::Error::from(io::ErrorKind::PermissionDenied);
        note_niceness_failure(-10, &error);
        assert!(!note_niceness_failure(-10, &error));
    }

    #[test]
    fn test_empty_generation() {
        for pool in pools() {
            let results = pool.evaluate(vec![], &weight_times_ticks).unwrap();
            assert!(results.is_empty());
        }
    }
}
