//! The observer walkthrough: one subject, five observers coming and going.

use std::sync::{Arc, Mutex, PoisonError};

use fanout::config::{RegistrySettings, Settings};
use fanout::{DeliveryReport, Registry, RegistryError, Subscriber, SubscriberHandle, UpdateResult};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sync,
    Async,
}

/// Publisher side: owns the registry and the current message.
pub struct Subject {
    registry: Registry<String>,
    mode: Mode,
}

impl Subject {
    pub fn new(settings: RegistrySettings, mode: Mode) -> Self {
        Self {
            registry: Registry::with_settings(settings),
            mode,
        }
    }

    pub fn attach(&self, number: usize) -> Result<Observer, RegistryError> {
        let inbox = Arc::new(Inbox {
            label: format!("observer-{number}"),
            number,
            last: Mutex::new(None),
        });
        let handle = self.registry.subscribe_shared(inbox.clone())?;
        info!("Hi, I'm the Observer \"{}\"", number);
        Ok(Observer { handle, inbox })
    }

    /// Stores `message` as the current state and notifies every observer.
    pub async fn create_message(&self, message: &str) -> Result<DeliveryReport, RegistryError> {
        info!(
            "There are {} observers in the list",
            self.registry.subscriber_count()
        );
        match self.mode {
            Mode::Sync => self.registry.publish(message.to_string()),
            Mode::Async => Ok(self.registry.publish_async(message.to_string())?.await),
        }
    }

    pub async fn some_business_logic(&self) -> Result<DeliveryReport, RegistryError> {
        let report = self.create_message("change message message").await?;
        info!("I'm about to do something important");
        Ok(report)
    }

    pub fn observer_count(&self) -> usize {
        self.registry.subscriber_count()
    }
}

struct Inbox {
    label: String,
    number: usize,
    last: Mutex<Option<String>>,
}

impl Subscriber<String> for Inbox {
    fn update(&self, message: &String) -> UpdateResult {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.clone());
        info!(
            "Observer \"{}\": a new message is available --> {}",
            self.number, message
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Subscriber side: the handle plus what the observer last saw.
pub struct Observer {
    handle: SubscriberHandle<String>,
    inbox: Arc<Inbox>,
}

impl Observer {
    pub fn last_message(&self) -> Option<String> {
        self.inbox
            .last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn remove_me_from_the_list(self) {
        let number = self.inbox.number;
        self.handle.unsubscribe();
        info!("Observer \"{}\" removed from the list", number);
    }
}

fn print_report(report: &DeliveryReport, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        let names: Vec<&str> = report.deliveries.iter().map(|d| d.name.as_str()).collect();
        println!(
            "message #{} (generation {}) -> [{}]",
            report.sequence,
            report.generation,
            names.join(", ")
        );
        for failure in report.failures() {
            println!("  failed: {failure}");
        }
    }
    Ok(())
}

pub async fn run(settings: Settings, mode: Mode, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let subject = Subject::new(settings.registry, mode);

    let observer1 = subject.attach(1)?;
    let observer2 = subject.attach(2)?;
    let observer3 = subject.attach(3)?;

    print_report(&subject.create_message("Hello World! :D").await?, json)?;
    observer3.remove_me_from_the_list();

    print_report(&subject.create_message("The weather is hot today! :p").await?, json)?;
    let observer4 = subject.attach(4)?;

    observer2.remove_me_from_the_list();
    let observer5 = subject.attach(5)?;

    print_report(&subject.create_message("My new car is great! ;)").await?, json)?;
    print_report(&subject.some_business_logic().await?, json)?;

    if let Some(last) = observer1.last_message() {
        info!("Observer \"1\" last saw: {}", last);
    }

    observer5.remove_me_from_the_list();
    observer4.remove_me_from_the_list();
    observer1.remove_me_from_the_list();

    info!("{} observers left", subject.observer_count());
    Ok(())
}
