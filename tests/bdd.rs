use std::{
    collections::VecDeque,
    fmt,
    fs::File,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use cucumber::{given, then, when, World as _};
use shoreplan::{
    config::AppConfig,
    db::init_pool,
    models::{
        plan::{DayPlan, PlanStatus},
        port::{CreatePortRequest, Port},
        preferences::{ActivityLevel, Budget, PartyType, Preferences, TransportMode},
        trip::Trip,
    },
    plan::orchestrator::{self, GeneratePlanRequest},
    services::llm::{LlmBackend, LlmError},
    state::AppState,
};
use tempfile::TempDir;

const VISIT_DATE: &str = "2026-05-14";

/// One reply the scripted model will produce, in order. Generation steps
/// pop from the front.
enum ScriptedReply {
    Text(String),
    Quota { retry_after: u64 },
    Timeout,
}

#[derive(Default)]
struct ScriptedLlm {
    replies: Mutex<VecDeque<ScriptedReply>>,
}

impl ScriptedLlm {
    fn push(&self, reply: ScriptedReply) {
        self.replies.lock().expect("script lock").push_back(reply);
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
        let reply = self
            .replies
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(ScriptedReply::Timeout);
        match reply {
            ScriptedReply::Text(text) => Ok(text),
            ScriptedReply::Quota { retry_after } => Err(LlmError::QuotaExceeded {
                retry_after: Some(retry_after),
            }),
            ScriptedReply::Timeout => Err(LlmError::Timeout(Duration::from_secs(30))),
        }
    }
}

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    trip: Option<Trip>,
    port: Option<Port>,
    plan: Option<DayPlan>,
    lookup_found: Option<bool>,
}

impl AppWorld {
    fn app(&self) -> &AppState {
        &self.state.as_ref().expect("state must be initialised").app
    }

    fn llm(&self) -> &ScriptedLlm {
        &self.state.as_ref().expect("state must be initialised").llm
    }

    fn trip(&self) -> &Trip {
        self.trip.as_ref().expect("a trip must exist first")
    }

    fn port(&self) -> &Port {
        self.port.as_ref().expect("a port must exist first")
    }

    fn plan(&self) -> &DayPlan {
        self.plan.as_ref().expect("a plan must be generated first")
    }
}

struct TestState {
    app: AppState,
    llm: Arc<ScriptedLlm>,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        File::create(&db_path)?;
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: ([127, 0, 0, 1], 0).into(),
            allowed_origins: vec!["http://localhost:3000".into()],
            groq_api_key: Some("bdd-test-key".into()),
            groq_model: "bdd-test-model".into(),
            llm_timeout: Duration::from_secs(5),
            invalid_response_retries: 0,
            // Nothing listens here: weather lookups fail fast and the
            // pipeline must carry on without a snapshot.
            weather_base_url: "http://127.0.0.1:9".into(),
        };

        let db = init_pool(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let llm = Arc::new(ScriptedLlm::default());
        let app = AppState::new(config, db, Some(llm.clone() as Arc<dyn LlmBackend>));
        Ok(Self {
            app,
            llm,
            _root: root,
        })
    }
}

fn preferences() -> Preferences {
    Preferences {
        party_type: PartyType::Couple,
        activity_level: ActivityLevel::Moderate,
        transport_mode: TransportMode::Mixed,
        budget: Budget::Medium,
        currency: "EUR".into(),
    }
}

fn valid_barcelona_plan() -> String {
    r#"{"activities": [
        {"order": 1, "name": "Sagrada Familia", "description": "Gaudi's basilica.",
         "start_time": "09:00", "end_time": "11:00", "duration_minutes": 120,
         "location": "Eixample", "latitude": 41.4036, "longitude": 2.1744,
         "cost_estimate": "26 EUR",
         "booking_url": "https://www.viator.com/tours/Barcelona/sagrada/d562-1234",
         "transport_to_next": "metro", "travel_time_to_next": 20},
        {"order": 2, "name": "Gothic Quarter and Boqueria Market",
         "description": "Old town lanes and market lunch.",
         "start_time": "11:30", "end_time": "13:30", "duration_minutes": 120,
         "location": "Ciutat Vella", "cost_estimate": "15-20 EUR",
         "transport_to_next": "walk", "travel_time_to_next": 15},
        {"order": 3, "name": "Barceloneta Beach", "description": "Seafront stroll.",
         "start_time": "14:00", "end_time": "16:00", "duration_minutes": 120,
         "location": "Barceloneta", "cost_estimate": "free"}
    ]}"#
    .to_string()
}

// --- Given ---

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.trip = None;
    world.port = None;
    world.plan = None;
}

#[given(regex = r#"^device "([^"]+)" has a trip on ship "([^"]+)"$"#)]
async fn given_trip(world: &mut AppWorld, device: String, ship: String) {
    let trip = Trip::new(&device, &ship, Some("Royal Caribbean".into()));
    world.app().store.create_trip(&trip).await.expect("create trip");
    world.trip = Some(trip);
}

#[given(regex = r#"^the trip calls at "([^"]+)" from "(\d{2}:\d{2})" to "(\d{2}:\d{2})"$"#)]
async fn given_port(world: &mut AppWorld, name: String, arrival: String, departure: String) {
    let day: NaiveDate = VISIT_DATE.parse().expect("visit date");
    let arrival = NaiveTime::parse_from_str(&arrival, "%H:%M").expect("arrival time");
    let departure = NaiveTime::parse_from_str(&departure, "%H:%M").expect("departure time");
    let trip = world.trip().clone();
    let request = CreatePortRequest {
        name,
        country: "Spain".into(),
        latitude: 41.38,
        longitude: 2.18,
        arrival_time: day.and_time(arrival),
        departure_time: day.and_time(departure),
    };
    request.validate().expect("valid port");
    let port = request.into_port(&trip.id);
    world
        .app()
        .store
        .put_port(&port, &trip.device_id)
        .await
        .expect("create port");
    world.port = Some(port);
}

#[given("the model will reply with a valid Barcelona day plan")]
async fn given_valid_reply(world: &mut AppWorld) {
    world.llm().push(ScriptedReply::Text(valid_barcelona_plan()));
}

#[given("the model will reply with a fenced out-of-order plan")]
async fn given_fenced_reply(world: &mut AppWorld) {
    let text = format!(
        "Here is the plan you asked for!\n```json\n{}\n```\nHave a great day ashore.",
        r#"{"activities": [
            {"order": 2, "name": "Boqueria Market", "start_time": "12:00",
             "end_time": "13:30", "location": "La Rambla", "cost_estimate": "15 EUR"},
            {"order": 1, "name": "Sagrada Familia", "start_time": "09:00",
             "end_time": "11:00", "location": "Eixample", "cost_estimate": "26 EUR"}
        ]}"#
    );
    world.llm().push(ScriptedReply::Text(text));
}

#[given("the model will reply with prose only")]
async fn given_prose_reply(world: &mut AppWorld) {
    world.llm().push(ScriptedReply::Text(
        "I'm sorry, I can't produce an itinerary right now.".into(),
    ));
}

#[given(regex = r"^the model will fail with quota exceeded and a retry hint of (\d+) seconds$")]
async fn given_quota_reply(world: &mut AppWorld, retry_after: u64) {
    world.llm().push(ScriptedReply::Quota { retry_after });
}

#[given("the model will time out")]
async fn given_timeout_reply(world: &mut AppWorld) {
    world.llm().push(ScriptedReply::Timeout);
}

#[given("the AI credential is not configured")]
async fn given_not_configured(world: &mut AppWorld) {
    world.state.as_mut().expect("state").app.llm = None;
}

// --- When ---

#[when(regex = r#"^device "([^"]+)" generates a day plan for that port$"#)]
async fn when_generate(world: &mut AppWorld, device: String) {
    let request = GeneratePlanRequest {
        trip_id: world.trip().id.clone(),
        port_id: world.port().id.clone(),
        preferences: preferences(),
    };
    let plan = orchestrator::generate(world.app(), &device, request)
        .await
        .expect("generation should persist a plan");
    world.plan = Some(plan);
}

#[when(regex = r#"^device "([^"]+)" looks up that trip$"#)]
async fn when_lookup_trip(world: &mut AppWorld, device: String) {
    let trip_id = world.trip().id.clone();
    let found = world
        .app()
        .store
        .get_trip(&trip_id, &device)
        .await
        .expect("lookup");
    world.lookup_found = Some(found.is_some());
}

#[when(regex = r#"^device "([^"]+)" deletes the trip$"#)]
async fn when_delete_trip(world: &mut AppWorld, device: String) {
    let trip_id = world.trip().id.clone();
    let deleted = world
        .app()
        .store
        .delete_trip(&trip_id, &device)
        .await
        .expect("delete");
    assert!(deleted, "trip should have been deletable by its owner");
}

// --- Then ---

#[then(regex = r#"^the plan status is "([^"]+)"$"#)]
async fn then_plan_status(world: &mut AppWorld, status: String) {
    let expected = match status.as_str() {
        "succeeded" => PlanStatus::Succeeded,
        "failed" => PlanStatus::Failed,
        other => panic!("unknown status {other}"),
    };
    assert_eq!(world.plan().status, expected);
}

#[then(regex = r"^the plan has at least (\d+) activities$")]
async fn then_min_activities(world: &mut AppWorld, minimum: usize) {
    assert!(world.plan().activities.len() >= minimum);
}

#[then("the activity orders are contiguous from 1")]
async fn then_orders_contiguous(world: &mut AppWorld) {
    let orders: Vec<u32> = world.plan().activities.iter().map(|a| a.order).collect();
    let expected: Vec<u32> = (1..=orders.len() as u32).collect();
    assert_eq!(orders, expected);
}

#[then("every activity lies inside the visit window")]
async fn then_activities_in_window(world: &mut AppWorld) {
    let port = world.port();
    let arrival = port.arrival_time.time();
    let departure = port.departure_time.time();
    for activity in &world.plan().activities {
        assert!(activity.start_time >= arrival, "{} starts too early", activity.name);
        assert!(activity.end_time <= departure, "{} ends too late", activity.name);
        assert!(activity.start_time <= activity.end_time);
    }
}

#[then(regex = r#"^activity "([^"]+)" comes before "([^"]+)"$"#)]
async fn then_activity_order(world: &mut AppWorld, first: String, second: String) {
    let activities = &world.plan().activities;
    let position = |name: &str| {
        activities
            .iter()
            .position(|a| a.name == name)
            .unwrap_or_else(|| panic!("activity {name} missing"))
    };
    assert!(position(&first) < position(&second));
}

#[then(regex = r#"^the plan error kind is "([^"]+)"$"#)]
async fn then_error_kind(world: &mut AppWorld, kind: String) {
    let error = world.plan().error.as_ref().expect("failed plan carries detail");
    assert_eq!(error.error, kind);
    assert!(!error.message.is_empty());
    assert!(!error.troubleshooting.is_empty());
}

#[then(regex = r"^the plan retry hint is (\d+) seconds$")]
async fn then_retry_hint(world: &mut AppWorld, seconds: u64) {
    let error = world.plan().error.as_ref().expect("failed plan carries detail");
    assert_eq!(error.retry_after, Some(seconds));
}

#[then("the plan has no activities")]
async fn then_no_activities(world: &mut AppWorld) {
    assert!(world.plan().activities.is_empty());
}

#[then("exactly one plan exists for that port")]
async fn then_one_plan(world: &mut AppWorld) {
    let trip = world.trip();
    let plans = world
        .app()
        .store
        .list_plans(&trip.device_id, Some(&trip.id), None)
        .await
        .expect("list plans");
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].id, world.plan().id);
}

#[then("the trip is not visible")]
async fn then_trip_hidden(world: &mut AppWorld) {
    assert_eq!(world.lookup_found, Some(false));
}

#[then(regex = r#"^device "([^"]+)" can still see the trip$"#)]
async fn then_trip_visible(world: &mut AppWorld, device: String) {
    let trip_id = world.trip().id.clone();
    let found = world
        .app()
        .store
        .get_trip(&trip_id, &device)
        .await
        .expect("lookup");
    assert!(found.is_some());
}

#[then("no plans remain for that port")]
async fn then_no_plans(world: &mut AppWorld) {
    let trip = world.trip();
    let port = world.port();
    let remaining = world
        .app()
        .store
        .get_plan_for_port(&trip.id, &port.id, &trip.device_id)
        .await
        .expect("plan lookup");
    assert!(remaining.is_none());
}

#[then(regex = r#"^the first booking link points at "([^"]+)"$"#)]
async fn then_booking_link(world: &mut AppWorld, host: String) {
    let url = world.plan().activities[0]
        .booking_url
        .as_ref()
        .expect("first activity keeps its booking link");
    assert!(url.contains(&host), "unexpected booking url {url}");
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run_and_exit("tests/features")
        .await;
}
