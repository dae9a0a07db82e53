use crate::clerk::Clerk;
use crate::config::{Config, TimeUnit};
use crate::counter::{Counter, Departure};
use crate::customer::CustomerRecord;
use crate::customer_task::run_customer;
use crate::error::AcsError;
use crate::events::{EventSink, RealTimeLog, Silent};
use crate::file_reader::validate_customers;
use crate::monitor::spawn_monitor;
use serde::Serialize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ClassSummary {
    pub class: usize,
    pub served: usize,
    pub average_wait: Duration,
}

// Result of a run: every departure ordered by service start, plus per-class figures.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub departures: Vec<Departure>,
    pub classes: Vec<ClassSummary>,
    pub elapsed: Duration,
}

impl Report {
    pub fn new(mut departures: Vec<Departure>, classes: usize, elapsed: Duration) -> Self {
        departures.sort_by_key(|d| d.started);
        let classes = (0..classes)
            .map(|class| {
                let waits: Vec<Duration> = departures
                    .iter()
                    .filter(|d| d.customer.class == class)
                    .map(|d| d.waited)
                    .collect();
                let average_wait = if waits.is_empty() {
                    Duration::ZERO
                } else {
                    waits.iter().sum::<Duration>() / waits.len() as u32
                };
                ClassSummary {
                    class,
                    served: waits.len(),
                    average_wait,
                }
            })
            .collect();
        Report {
            departures,
            classes,
            elapsed,
        }
    }

    pub fn summary_lines(&self, unit: TimeUnit) -> Vec<String> {
        let mut lines = vec![format!(
            "{} customers served in {}",
            self.departures.len(),
            unit.format(self.elapsed)
        )];
        for summary in &self.classes {
            lines.push(format!(
                "class {}: {} served, average wait {}",
                summary.class,
                summary.served,
                unit.format(summary.average_wait)
            ));
        }
        lines
    }
}

// Closes the counter and joins every clerk. Only valid once no customer can
// still be waiting for a clerk.
fn close_and_join(counter: &Counter, clerks: Vec<JoinHandle<()>>) {
    counter.close();
    for clerk in clerks {
        if clerk.join().is_err() {
            log::error!("[SIMULATION] A clerk panicked");
        }
    }
}

// Process lifecycle of one run: starts the clerks and the customers, waits for
// every customer, then closes the counter and joins the clerks.
pub struct Simulation {
    counter: Arc<Counter>,
}

impl Simulation {
    // Builds a run whose customer events go to the real-time log or nowhere,
    // depending on `config.real_time`.
    pub fn new(config: Config) -> Result<Self, AcsError> {
        let sink: Box<dyn EventSink> = if config.real_time {
            Box::new(RealTimeLog::new(config.time_unit))
        } else {
            Box::new(Silent)
        };
        Simulation::with_sink(config, sink)
    }

    pub fn with_sink(config: Config, sink: Box<dyn EventSink>) -> Result<Self, AcsError> {
        config.validate()?;
        Ok(Simulation {
            counter: Arc::new(Counter::new(config, sink)),
        })
    }

    #[cfg(test)]
    pub fn counter(&self) -> &Arc<Counter> {
        &self.counter
    }

    pub fn spawn_clerks(&self) -> Result<Vec<JoinHandle<()>>, AcsError> {
        (0..self.counter.config().clerks)
            .map(|id| {
                let counter = self.counter.clone();
                thread::Builder::new()
                    .name(format!("clerk-{}", id))
                    .spawn(move || Clerk::new(id, &counter).run())
                    .map_err(|source| AcsError::Spawn {
                        what: format!("clerk {}", id),
                        source,
                    })
            })
            .collect()
    }

    // Validates the customers and starts one task per customer.
    pub fn spawn_customers(
        &self,
        customers: Vec<CustomerRecord>,
    ) -> Result<Vec<JoinHandle<Departure>>, AcsError> {
        validate_customers(&customers, self.counter.config().classes)?;
        customers
            .into_iter()
            .map(|customer| {
                let counter = self.counter.clone();
                let id = customer.id;
                thread::Builder::new()
                    .name(format!("customer-{}", id))
                    .spawn(move || run_customer(&counter, customer))
                    .map_err(|source| AcsError::Spawn {
                        what: format!("customer {}", id),
                        source,
                    })
            })
            .collect()
    }

    // Waits for every customer, then stops the clerks.
    //
    // A clerk can only be blocked on its handshake while some customer is
    // being served, so once every customer joined each clerk reaches its next
    // poll and sees the counter closed.
    pub async fn finish(
        &self,
        customers: Vec<JoinHandle<Departure>>,
        clerks: Vec<JoinHandle<()>>,
    ) -> Result<Report, AcsError> {
        let counter = self.counter.clone();
        tokio::task::spawn_blocking(move || {
            let mut departures = Vec::with_capacity(customers.len());
            let mut panicked = false;
            for customer in customers {
                match customer.join() {
                    Ok(departure) => departures.push(departure),
                    Err(_) => panicked = true,
                }
            }

            close_and_join(&counter, clerks);

            if panicked {
                return Err(AcsError::Join("customer"));
            }
            Ok(Report::new(
                departures,
                counter.class_count(),
                counter.elapsed(),
            ))
        })
        .await
        .map_err(|_| AcsError::Join("driver"))?
    }

    // Stops clerks started for a run that could not start its customers.
    pub async fn abort(&self, clerks: Vec<JoinHandle<()>>) -> Result<(), AcsError> {
        let counter = self.counter.clone();
        tokio::task::spawn_blocking(move || close_and_join(&counter, clerks))
            .await
            .map_err(|_| AcsError::Join("driver"))
    }

    pub async fn run(self, customers: Vec<CustomerRecord>) -> Result<Report, AcsError> {
        let config = self.counter.config().clone();
        log::info!(
            "[SIMULATION] {} customers, {} clerks, {} classes",
            customers.len(),
            config.clerks,
            config.classes
        );

        let clerks = self.spawn_clerks()?;
        let customers = match self.spawn_customers(customers) {
            Ok(customers) => customers,
            Err(e) => {
                self.abort(clerks).await?;
                return Err(e);
            }
        };
        let monitor = if config.real_time {
            None
        } else {
            Some(spawn_monitor(self.counter.clone()))
        };

        let report = self.finish(customers, clerks).await;

        if let Some(monitor) = monitor {
            monitor.abort();
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::Recording;
    use crate::events::EventKind;
    use std::collections::{HashMap, HashSet};

    fn config(clerks: usize, classes: usize) -> Config {
        Config {
            clerks,
            classes,
            time_unit: TimeUnit::Millis,
            ..Config::default()
        }
    }

    fn recorded(clerks: usize, classes: usize) -> (Simulation, Arc<Recording>) {
        let recording = Arc::new(Recording::default());
        let simulation =
            Simulation::with_sink(config(clerks, classes), Box::new(recording.clone())).unwrap();
        (simulation, recording)
    }

    async fn wait_until_queued(counter: &Counter, lens: &[usize]) {
        loop {
            let snapshot = counter.snapshot();
            let current: Vec<usize> = snapshot.queues.iter().map(|q| q.len).collect();
            if current == lens {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn single_customer_is_served_and_queues_drain() {
        let (simulation, recording) = recorded(1, 2);
        let counter = simulation.counter().clone();

        let report = simulation
            .run(vec![
                CustomerRecord::new(1, 0, 0, 40),
                CustomerRecord::new(2, 0, 120, 10),
            ])
            .await
            .unwrap();

        assert_eq!(report.departures.len(), 2);
        let first = &report.departures[0];
        assert_eq!(first.customer.id, 1);
        assert_eq!(first.clerk, 0);
        assert!(first.finished - first.started >= Duration::from_millis(40));
        // The clerk went back to scanning and picked up the late customer.
        assert_eq!(report.departures[1].customer.id, 2);
        assert!(report.departures[1].started >= first.finished);

        let snapshot = counter.snapshot();
        assert!(snapshot.queues.iter().all(|q| q.len == 0));
        assert!(snapshot.arriving.is_empty());
        assert_eq!(snapshot.leaving.len(), 2);
        assert_eq!(
            recording.kinds_of(1),
            vec![
                EventKind::Arrived,
                EventKind::BeingServed(0),
                EventKind::Finished(0),
                EventKind::Left
            ]
        );
    }

    #[tokio::test]
    async fn higher_class_is_served_first() {
        let (simulation, recording) = recorded(1, 2);
        let customers = simulation
            .spawn_customers(vec![
                CustomerRecord::new(1, 0, 0, 20),
                CustomerRecord::new(2, 1, 0, 20),
            ])
            .unwrap();
        wait_until_queued(simulation.counter(), &[1, 1]).await;

        let clerks = simulation.spawn_clerks().unwrap();
        let report = simulation.finish(customers, clerks).await.unwrap();

        let order: Vec<u32> = report.departures.iter().map(|d| d.customer.id).collect();
        assert_eq!(order, vec![2, 1]);
        assert!(report.departures[1].started >= report.departures[0].finished);

        let served: Vec<u32> = recording
            .events()
            .iter()
            .filter(|e| matches!(e.kind, EventKind::BeingServed(_)))
            .map(|e| e.customer.id)
            .collect();
        assert_eq!(served, vec![2, 1]);
    }

    #[tokio::test]
    async fn two_clerks_split_one_class() {
        let (simulation, _) = recorded(2, 1);
        let customers = simulation
            .spawn_customers(vec![
                CustomerRecord::new(1, 0, 0, 60),
                CustomerRecord::new(2, 0, 0, 60),
            ])
            .unwrap();
        wait_until_queued(simulation.counter(), &[2]).await;

        let clerks = simulation.spawn_clerks().unwrap();
        let report = simulation.finish(customers, clerks).await.unwrap();

        assert_eq!(report.departures.len(), 2);
        let ids: HashSet<u32> = report.departures.iter().map(|d| d.customer.id).collect();
        assert_eq!(ids, HashSet::from([1, 2]));
        let clerks: HashSet<usize> = report.departures.iter().map(|d| d.clerk).collect();
        assert_eq!(clerks, HashSet::from([0, 1]));
    }

    #[tokio::test]
    async fn class_queue_is_served_in_arrival_order() {
        let (simulation, _) = recorded(1, 1);
        let report = simulation
            .run(vec![
                CustomerRecord::new(4, 0, 60, 30),
                CustomerRecord::new(1, 0, 0, 100),
                CustomerRecord::new(3, 0, 40, 30),
                CustomerRecord::new(2, 0, 20, 30),
            ])
            .await
            .unwrap();

        let order: Vec<u32> = report.departures.iter().map(|d| d.customer.id).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn every_customer_wins_exactly_once() {
        let (simulation, recording) = recorded(3, 2);
        let customers: Vec<CustomerRecord> = (1..=12)
            .map(|id| CustomerRecord::new(id, (id % 2) as usize, (id as u64 % 4) * 5, 15))
            .collect();

        let report = simulation.run(customers).await.unwrap();
        assert_eq!(report.departures.len(), 12);

        for id in 1..=12 {
            let kinds = recording.kinds_of(id);
            assert_eq!(kinds.len(), 4, "customer {}: {:?}", id, kinds);
            assert_eq!(kinds[0], EventKind::Arrived);
            match (kinds[1], kinds[2]) {
                (EventKind::BeingServed(a), EventKind::Finished(b)) => assert_eq!(a, b),
                other => panic!("customer {}: unexpected {:?}", id, other),
            }
            assert_eq!(kinds[3], EventKind::Left);
        }

        // A clerk finishes a service before starting the next one.
        let mut by_clerk: HashMap<usize, Vec<&Departure>> = HashMap::new();
        for departure in &report.departures {
            by_clerk.entry(departure.clerk).or_default().push(departure);
        }
        for services in by_clerk.values() {
            for pair in services.windows(2) {
                assert!(pair[1].started >= pair[0].finished);
            }
        }

        let served: usize = report.classes.iter().map(|c| c.served).sum();
        assert_eq!(served, 12);
    }

    #[tokio::test]
    async fn invalid_customers_stop_the_clerks() {
        let simulation = Simulation::new(config(2, 2)).unwrap();
        let counter = simulation.counter().clone();
        let result = simulation
            .run(vec![
                CustomerRecord::new(1, 0, 0, 1),
                CustomerRecord::new(2, 2, 0, 1),
            ])
            .await;
        assert!(matches!(result, Err(AcsError::InvalidClass { .. })));

        // The clerks were stopped and no customer ever reached a queue.
        assert!(counter.is_closed());
        assert_eq!(Arc::strong_count(&counter), 1);
        let snapshot = counter.snapshot();
        assert!(snapshot.arriving.is_empty());
        assert!(snapshot.queues.iter().all(|q| q.len == 0));
    }

    #[test]
    fn report_averages_wait_per_class() {
        let departure = |id, class, waited_ms| Departure {
            customer: CustomerRecord::new(id, class, 0, 1),
            clerk: 0,
            waited: Duration::from_millis(waited_ms),
            started: Duration::from_millis(id as u64),
            finished: Duration::from_millis(id as u64 + 1),
        };
        let report = Report::new(
            vec![departure(2, 1, 30), departure(1, 1, 10), departure(3, 0, 5)],
            3,
            Duration::from_millis(100),
        );

        assert_eq!(
            report.departures.iter().map(|d| d.customer.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(report.classes[0].served, 1);
        assert_eq!(report.classes[0].average_wait, Duration::from_millis(5));
        assert_eq!(report.classes[1].served, 2);
        assert_eq!(report.classes[1].average_wait, Duration::from_millis(20));
        assert_eq!(report.classes[2].served, 0);
        assert_eq!(report.classes[2].average_wait, Duration::ZERO);
        assert_eq!(report.summary_lines(TimeUnit::Millis)[0], "3 customers served in 100.00ms");
    }
}
