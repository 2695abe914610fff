// coordinator/src/registry.rs

use common::{Assignment, JobConfig, Phase, TaskId};
use std::{
    collections::{HashSet, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::sync::watch;

/// Resultado de pedir una tarea reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceAssignment {
    /// Todavía hay maps sin completar.
    NotReady,
    Task(TaskId),
    /// Ya se despacharon todas las tareas reduce.
    Exhausted,
}

/// Qué pasó con un reporte de tarea terminada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Recorded,
    /// Ya estaba completada: no cambia ningún contador.
    Duplicate,
    /// Id fuera de `[0, N)` / `[0, M)`.
    OutOfRange,
    /// El id sigue pendiente, nunca se despachó.
    NotDispatched,
}

#[derive(Debug)]
struct PhaseQueues {
    // ids pendientes, en orden ascendente
    pending: VecDeque<TaskId>,
    // set, no lista: los reportes duplicados no inflan el conteo
    completed: HashSet<TaskId>,
    total: u32,
}

impl PhaseQueues {
    fn new(total: u32) -> Self {
        Self {
            pending: (0..total).collect(),
            completed: HashSet::new(),
            total,
        }
    }

    fn is_done(&self) -> bool {
        self.completed.len() == self.total as usize
    }
}

#[derive(Debug)]
struct Queues {
    map: PhaseQueues,
    reduce: PhaseQueues,
}

impl Queues {
    fn phase_mut(&mut self, phase: Phase) -> &mut PhaseQueues {
        match phase {
            Phase::Map => &mut self.map,
            Phase::Reduce => &mut self.reduce,
        }
    }

    fn take_reduce(&mut self) -> ReduceAssignment {
        // el gate mira completadas, no la cola de pendientes: un map
        // despachado puede seguir escribiendo sus intermedios
        if !self.map.is_done() {
            return ReduceAssignment::NotReady;
        }
        match self.reduce.pending.pop_front() {
            Some(id) => ReduceAssignment::Task(id),
            None => ReduceAssignment::Exhausted,
        }
    }
}

/// Estado de tareas del job: colas pendientes y sets de completadas por fase.
///
/// Toda mutación pasa por un único mutex. Cada reduce completada actualiza un
/// canal `watch` con el conteo, así el monitor no necesita el lock.
#[derive(Debug)]
pub struct TaskRegistry {
    job: JobConfig,
    queues: Mutex<Queues>,
    reduce_done_tx: watch::Sender<u32>,
}

impl TaskRegistry {
    pub fn new(job: JobConfig) -> Self {
        let (reduce_done_tx, _) = watch::channel(0);
        Self {
            job,
            queues: Mutex::new(Queues {
                map: PhaseQueues::new(job.map_tasks()),
                reduce: PhaseQueues::new(job.reduce_tasks()),
            }),
            reduce_done_tx,
        }
    }

    pub fn job(&self) -> &JobConfig {
        &self.job
    }

    fn lock(&self) -> MutexGuard<'_, Queues> {
        // ninguna sección crítica deja las colas a medio modificar
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Saca el menor id map pendiente.
    pub fn take_map(&self) -> Option<TaskId> {
        self.lock().map.pending.pop_front()
    }

    pub fn take_reduce(&self) -> ReduceAssignment {
        self.lock().take_reduce()
    }

    /// Siguiente tarea para un worker: primero maps, después reduce (con gate),
    /// todo bajo un solo lock.
    pub fn next_assignment(&self) -> Assignment {
        let mut queues = self.lock();

        if let Some(id) = queues.map.pending.pop_front() {
            return Assignment::Assigned {
                phase: Phase::Map,
                id,
            };
        }

        match queues.take_reduce() {
            ReduceAssignment::NotReady => Assignment::NotReadyYet,
            ReduceAssignment::Task(id) => Assignment::Assigned {
                phase: Phase::Reduce,
                id,
            },
            ReduceAssignment::Exhausted => Assignment::NoTask,
        }
    }

    /// Registra una tarea terminada. Idempotente.
    pub fn mark_complete(&self, phase: Phase, id: TaskId) -> CompletionOutcome {
        let mut queues = self.lock();
        let queue = queues.phase_mut(phase);

        if id >= queue.total {
            return CompletionOutcome::OutOfRange;
        }
        if queue.pending.contains(&id) {
            return CompletionOutcome::NotDispatched;
        }
        if !queue.completed.insert(id) {
            return CompletionOutcome::Duplicate;
        }

        // se publica con el lock tomado: dos completados simultáneos no
        // pueden dejar en el canal un conteo viejo
        if phase == Phase::Reduce {
            let reduce_done = queues.reduce.completed.len() as u32;
            self.reduce_done_tx.send_replace(reduce_done);
        }
        CompletionOutcome::Recorded
    }

    pub fn map_done_count(&self) -> u32 {
        self.lock().map.completed.len() as u32
    }

    pub fn reduce_done_count(&self) -> u32 {
        self.lock().reduce.completed.len() as u32
    }

    /// Canal con la cantidad de reduce completadas; cambia en cada completado nuevo.
    pub fn watch_reduce_done(&self) -> watch::Receiver<u32> {
        self.reduce_done_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    fn registry(n: u32, m: u32) -> TaskRegistry {
        TaskRegistry::new(JobConfig::new(n, m).unwrap())
    }

    fn drain_maps(reg: &TaskRegistry) -> Vec<TaskId> {
        std::iter::from_fn(|| reg.take_map()).collect()
    }

    #[test]
    fn take_map_devuelve_ids_en_orden_ascendente() {
        let reg = registry(3, 1);
        assert_eq!(drain_maps(&reg), vec![0, 1, 2]);
        assert_eq!(reg.take_map(), None);
        assert_eq!(reg.map_done_count(), 0);
    }

    #[test]
    fn reduce_espera_completados_no_despachos() {
        let reg = registry(2, 2);
        drain_maps(&reg);

        // todos despachados, ninguno completado
        assert_eq!(reg.take_reduce(), ReduceAssignment::NotReady);

        reg.mark_complete(Phase::Map, 0);
        assert_eq!(reg.take_reduce(), ReduceAssignment::NotReady);

        reg.mark_complete(Phase::Map, 1);
        assert_eq!(reg.take_reduce(), ReduceAssignment::Task(0));
        assert_eq!(reg.take_reduce(), ReduceAssignment::Task(1));
        assert_eq!(reg.take_reduce(), ReduceAssignment::Exhausted);
    }

    #[test]
    fn mark_complete_es_idempotente() {
        let reg = registry(2, 1);
        drain_maps(&reg);

        assert_eq!(reg.mark_complete(Phase::Map, 1), CompletionOutcome::Recorded);
        assert_eq!(reg.mark_complete(Phase::Map, 1), CompletionOutcome::Duplicate);
        assert_eq!(reg.map_done_count(), 1);

        // el duplicado no abre el gate
        assert_eq!(reg.take_reduce(), ReduceAssignment::NotReady);
    }

    #[test]
    fn ignora_reportes_fuera_de_rango_o_no_despachados() {
        let reg = registry(2, 2);
        assert_eq!(reg.mark_complete(Phase::Map, 5), CompletionOutcome::OutOfRange);
        assert_eq!(reg.mark_complete(Phase::Map, 0), CompletionOutcome::NotDispatched);
        assert_eq!(reg.mark_complete(Phase::Reduce, 1), CompletionOutcome::NotDispatched);
        assert_eq!(reg.map_done_count(), 0);
        assert_eq!(reg.reduce_done_count(), 0);
    }

    #[test]
    fn next_assignment_recorre_todo_el_ciclo() {
        let reg = registry(1, 1);

        assert_eq!(
            reg.next_assignment(),
            Assignment::Assigned {
                phase: Phase::Map,
                id: 0
            }
        );
        assert_eq!(reg.next_assignment(), Assignment::NotReadyYet);

        reg.mark_complete(Phase::Map, 0);
        assert_eq!(
            reg.next_assignment(),
            Assignment::Assigned {
                phase: Phase::Reduce,
                id: 0
            }
        );
        // reduce despachado pero no completado: ya no hay nada para dar
        assert_eq!(reg.next_assignment(), Assignment::NoTask);

        reg.mark_complete(Phase::Reduce, 0);
        assert_eq!(reg.reduce_done_count(), 1);
        assert_eq!(reg.next_assignment(), Assignment::NoTask);
    }

    #[test]
    fn watch_publica_reduce_completadas() {
        let reg = registry(1, 2);
        let rx = reg.watch_reduce_done();
        reg.take_map();
        reg.mark_complete(Phase::Map, 0);
        assert_eq!(*rx.borrow(), 0);

        reg.take_reduce();
        reg.take_reduce();
        reg.mark_complete(Phase::Reduce, 1);
        assert_eq!(*rx.borrow(), 1);
        reg.mark_complete(Phase::Reduce, 1);
        assert_eq!(*rx.borrow(), 1);
        reg.mark_complete(Phase::Reduce, 0);
        assert_eq!(*rx.borrow(), 2);
    }

    #[test]
    fn reduce_completados_en_paralelo_dejan_el_conteo_final_en_el_watch() {
        let m = 8;
        for _ in 0..500 {
            let reg = Arc::new(registry(1, m));
            let rx = reg.watch_reduce_done();
            reg.take_map();
            reg.mark_complete(Phase::Map, 0);
            for _ in 0..m {
                reg.take_reduce();
            }

            let barrier = Arc::new(Barrier::new(m as usize));
            let handles: Vec<_> = (0..m)
                .map(|id| {
                    let reg = reg.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        reg.mark_complete(Phase::Reduce, id)
                    })
                })
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), CompletionOutcome::Recorded);
            }

            assert_eq!(reg.reduce_done_count(), m);
            assert_eq!(*rx.borrow(), m);
        }
    }

    #[test]
    fn despacho_concurrente_no_repite_ids() {
        let n = 500;
        let reg = Arc::new(registry(n, 1));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = reg.clone();
                thread::spawn(move || drain_maps(&reg))
            })
            .collect();

        let mut all: Vec<TaskId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        assert_eq!(all, (0..n).collect::<Vec<_>>());
    }
}
