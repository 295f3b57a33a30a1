//! End-to-end widget scenarios against a recording host.

#![allow(unused_crate_dependencies)]

use std::cell::RefCell;
use std::rc::Rc;

use incident_viz::components::force_graph::scene::KeyedJoin;
use incident_viz::components::force_graph::simulation::Point;
use incident_viz::components::force_graph::{FetchCallback, LoadStatus, TimerCallback};
use incident_viz::loader::PageLocation;
use incident_viz::{Host, Result, WidgetConfig, WidgetError, WidgetHandle};
use serde_json::{Value, json};

/// Records every side effect; fetches and timers wait until released.
#[derive(Default)]
struct MockHost {
	search: RefCell<String>,
	hostname: RefCell<String>,
	posted: RefCell<Vec<Value>>,
	fetched: RefCell<Vec<String>>,
	fetches: RefCell<Vec<FetchCallback>>,
	timers: RefCell<Vec<(u32, TimerCallback)>>,
}

impl MockHost {
	fn new(search: &str) -> Rc<Self> {
		let host = Self::default();
		*host.search.borrow_mut() = search.to_string();
		*host.hostname.borrow_mut() = "app.example.com".to_string();
		Rc::new(host)
	}

	fn set_search(&self, search: &str) {
		*self.search.borrow_mut() = search.to_string();
	}

	/// Complete the oldest outstanding fetch.
	fn respond(&self, body: Result<String>) {
		let done = self.fetches.borrow_mut().remove(0);
		done(body);
	}

	fn fire_timers(&self) {
		let timers = std::mem::take(&mut *self.timers.borrow_mut());
		for (_, callback) in timers {
			callback();
		}
	}

	fn timer_durations(&self) -> Vec<u32> {
		self.timers.borrow().iter().map(|(ms, _)| *ms).collect()
	}
}

impl Host for MockHost {
	fn location(&self) -> PageLocation {
		PageLocation::parse(&self.search.borrow(), &self.hostname.borrow())
	}

	fn post_to_parent(&self, message: &Value) -> Result<()> {
		self.posted.borrow_mut().push(message.clone());
		Ok(())
	}

	fn fetch_text(&self, url: &str, done: FetchCallback) {
		self.fetched.borrow_mut().push(url.to_string());
		self.fetches.borrow_mut().push(done);
	}

	fn set_timeout(&self, ms: u32, callback: TimerCallback) {
		self.timers.borrow_mut().push((ms, callback));
	}
}

fn widget(host: &Rc<MockHost>) -> WidgetHandle {
	let host: Rc<dyn Host> = host.clone();
	WidgetHandle::new(host, WidgetConfig::default(), 800.0, 600.0)
}

fn n1_n2() -> Value {
	json!({
		"nodes": [{"id": "n1", "icon": "server"}, {"id": "n2", "icon": "user"}],
		"edges": [{"source": "n1", "target": "n2", "name": "uses"}]
	})
}

fn star() -> Value {
	json!({
		"nodes": [
			{"id": "hub", "icon": "server", "severity": "high"},
			{"id": "a", "icon": "user"},
			{"id": "b", "icon": "user"},
			{"id": "c", "icon": "laptop"}
		],
		"edges": [
			{"source": "hub", "target": "a", "name": "uses"},
			{"source": "hub", "target": "b"},
			{"source": "c", "target": "hub", "name": "reaches"}
		]
	})
}

fn response(data: Value) -> Value {
	json!({
		"type": WidgetConfig::default().event_name,
		"action": "load_data",
		"data": data
	})
}

fn status(handle: &WidgetHandle) -> LoadStatus {
	handle.with_state(|s| s.status().clone())
}

/// Stand-in for the SVG layer: one entry per rendered element.
#[derive(Default)]
struct Dom {
	images: KeyedJoin<String, u32>,
	lines: KeyedJoin<usize, u32>,
	created: u32,
}

impl Dom {
	fn sync(&mut self, handle: &WidgetHandle) -> (usize, usize) {
		let scene = handle.with_state(|s| s.scene());
		let created = &mut self.created;
		self.images
			.join(
				scene.nodes.iter().map(|n| n.id.clone()),
				|_| {
					*created += 1;
					Ok::<_, ()>(*created)
				},
				|_| {},
			)
			.unwrap();
		self.lines
			.join(
				scene.links.iter().map(|l| l.key),
				|_| {
					*created += 1;
					Ok::<_, ()>(*created)
				},
				|_| {},
			)
			.unwrap();
		(self.images.len(), self.lines.len())
	}
}

#[test]
fn local_mode_fetches_and_never_posts() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	handle.init();
	assert_eq!(
		*host.fetched.borrow(),
		vec!["http://localhost:8111/viz-data/overview-default-incident".to_string()]
	);
	assert!(host.posted.borrow().is_empty());
}

#[test]
fn widget_mode_posts_exactly_one_request() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	assert!(host.fetched.borrow().is_empty());
	let posted = host.posted.borrow();
	assert_eq!(posted.len(), 1);
	assert_eq!(posted[0]["action"], "DATA_REQUEST");
	assert_eq!(posted[0]["payload"]["action"], "load_data");
}

#[test]
fn transport_is_chosen_again_on_every_load() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	host.set_search("?local=true");
	handle.reload();
	assert_eq!(host.posted.borrow().len(), 1);
	assert_eq!(host.fetched.borrow().len(), 1);
}

#[test]
fn rendered_counts_match_document() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	handle.init();
	host.respond(Ok(star().to_string()));
	let mut dom = Dom::default();
	assert_eq!(dom.sync(&handle), (4, 3));
	assert_eq!(status(&handle), LoadStatus::Ready);
}

#[test]
fn end_to_end_two_node_fixture() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	handle.handle_message(response(n1_n2()));

	let scene = handle.with_state(|s| s.scene());
	assert_eq!(scene.nodes.len(), 2);
	assert_eq!(scene.links.len(), 1);
	let labels: Vec<_> = scene.links.iter().filter_map(|l| l.label.as_deref()).collect();
	assert_eq!(labels, vec!["uses"]);
	assert!(scene.nodes[0].href.ends_with("rect-server.svg"));
}

#[test]
fn reload_twice_rebinds_without_duplicates() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	let mut dom = Dom::default();

	handle.init();
	host.respond(Ok(star().to_string()));
	let first = dom.sync(&handle);

	for _ in 0..2 {
		handle.reload();
		host.respond(Ok(star().to_string()));
		assert_eq!(dom.sync(&handle), first);
	}
	assert_eq!(dom.images.len(), 4);
	assert_eq!(dom.lines.len(), 3);
}

#[test]
fn duplicate_responses_are_idempotent() {
	let host = MockHost::new("");
	let handle = widget(&host);
	let mut dom = Dom::default();
	handle.init();
	handle.handle_message(response(star()));
	let before = dom.sync(&handle);
	let created = dom.created;
	handle.handle_message(response(star()));
	assert_eq!(dom.sync(&handle), before);
	assert_eq!(dom.created, created);
}

#[test]
fn selection_is_exclusive() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	handle.handle_message(response(star()));

	handle.with_state_mut(|s| {
		s.click_node("a");
		s.click_node("b");
		assert_eq!(s.selection(), Some("b"));
		assert_eq!(s.scene().nodes.iter().filter(|n| n.selected).count(), 1);
		s.click_node("b");
		assert_eq!(s.selection(), None);
		s.click_node("a");
		s.click_background();
		assert_eq!(s.selection(), None);
	});
}

#[test]
fn drag_pins_and_double_click_reheats() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	handle.handle_message(response(n1_n2()));
	while handle.tick() {}

	handle.with_state_mut(|s| {
		s.drag_start("n2");
		s.drag_move(Point::new(120.0, 80.0));
		s.drag_end();
	});
	let pinned = handle.with_state(|s| s.simulation().nodes()[1]);
	assert_eq!((pinned.fx, pinned.fy), (Some(120.0), Some(80.0)));

	handle.with_state_mut(|s| s.double_click_node("n2"));
	handle.with_state(|s| {
		let node = s.simulation().nodes()[1];
		assert_eq!((node.fx, node.fy), (None, None));
		assert!(s.simulation().alpha() > 0.0);
		assert!(s.simulation().is_running());
	});
}

#[test]
fn clear_then_reload_shows_only_fresh_data() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	let mut dom = Dom::default();
	handle.init();
	host.respond(Ok(star().to_string()));
	dom.sync(&handle);

	handle.clear();
	assert_eq!(dom.sync(&handle), (0, 0));
	assert!(!handle.with_state(|s| s.simulation().is_running()));

	handle.reload();
	host.respond(Ok(n1_n2().to_string()));
	assert_eq!(dom.sync(&handle), (2, 1));
	assert!(handle.with_state(|s| s.simulation().is_running()));
}

#[test]
fn control_messages_apply_whatever_the_component() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	handle.handle_message(response(star()));

	handle.handle_message(json!({"action": "CLEAR_DATA", "componentId": "someone-else"}));
	assert!(handle.with_state(|s| s.scene().is_empty()));

	handle.handle_message(Value::String(r#"{"action":"DATA_REFRESH"}"#.into()));
	assert_eq!(host.posted.borrow().len(), 2);
	assert_eq!(host.posted.borrow()[0], host.posted.borrow()[1]);
}

#[test]
fn stale_fetch_is_discarded() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	handle.init();
	handle.reload();
	assert_eq!(host.fetches.borrow().len(), 2);

	host.respond(Ok(star().to_string()));
	assert!(handle.with_state(|s| s.scene().is_empty()));
	assert!(matches!(status(&handle), LoadStatus::Loading { .. }));

	host.respond(Ok(n1_n2().to_string()));
	assert_eq!(handle.with_state(|s| s.scene().nodes.len()), 2);
}

#[test]
fn fetch_finishing_after_clear_is_ignored() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	handle.init();
	handle.clear();
	host.respond(Ok(star().to_string()));
	assert!(handle.with_state(|s| s.scene().is_empty()));
	assert_eq!(status(&handle), LoadStatus::Cleared);
}

#[test]
fn http_failure_is_surfaced() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	handle.init();
	host.respond(Err(WidgetError::Http { status: 503 }));
	assert_eq!(
		status(&handle),
		LoadStatus::Failed("HTTP error! status: 503".into())
	);
}

#[test]
fn malformed_json_is_surfaced() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	handle.init();
	host.respond(Ok("{nodes:".into()));
	assert!(matches!(status(&handle), LoadStatus::Failed(m) if m.starts_with("malformed")));
}

#[test]
fn parent_error_keeps_current_graph() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	handle.handle_message(response(star()));
	handle.handle_message(json!({
		"type": WidgetConfig::default().event_name,
		"error": "backend unavailable"
	}));
	assert!(matches!(status(&handle), LoadStatus::Failed(m) if m.contains("backend unavailable")));
	assert_eq!(handle.with_state(|s| s.scene().nodes.len()), 4);
}

#[test]
fn response_without_data_or_error_is_an_error() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	handle.handle_message(json!({"topicName": WidgetConfig::default().event_name}));
	assert_eq!(
		status(&handle),
		LoadStatus::Failed(WidgetError::MissingData.to_string())
	);
}

#[test]
fn own_request_echo_is_ignored() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	let echo = host.posted.borrow()[0].clone();
	handle.handle_message(echo);
	assert!(matches!(status(&handle), LoadStatus::Loading { .. }));
}

#[test]
fn dangling_edge_rejects_whole_document() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	handle.handle_message(response(json!({
		"nodes": [{"id": "n1", "icon": "server"}],
		"edges": [{"source": "n1", "target": "ghost"}]
	})));
	assert!(handle.with_state(|s| s.scene().is_empty()));
	assert!(matches!(status(&handle), LoadStatus::Failed(m) if m.contains("ghost")));
}

#[test]
fn timeout_surfaces_and_late_data_still_lands() {
	let host = MockHost::new("");
	let handle = widget(&host);
	handle.init();
	assert_eq!(host.timer_durations(), vec![30_000]);

	host.fire_timers();
	assert_eq!(
		status(&handle),
		LoadStatus::Failed("timed out after 30000ms waiting for graph data".into())
	);

	handle.handle_message(response(n1_n2()));
	assert_eq!(status(&handle), LoadStatus::Ready);
}

#[test]
fn timer_after_success_does_nothing() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	handle.init();
	host.respond(Ok(n1_n2().to_string()));
	host.fire_timers();
	assert_eq!(status(&handle), LoadStatus::Ready);
}

#[test]
fn timeout_duration_follows_url_and_host() {
	let host = MockHost::new("?test_timeout=250");
	widget(&host).init();
	assert_eq!(host.timer_durations(), vec![250]);

	let local = MockHost::new("");
	*local.hostname.borrow_mut() = "localhost".into();
	widget(&local).init();
	assert_eq!(local.timer_durations(), vec![5_000]);
}

#[test]
fn destroyed_widget_ignores_everything() {
	let host = MockHost::new("?local=true");
	let handle = widget(&host);
	handle.init();
	handle.destroy();
	host.respond(Ok(star().to_string()));
	handle.handle_message(json!({"action": "DATA_REFRESH"}));
	handle.reload();
	assert!(handle.is_destroyed());
	assert!(handle.with_state(|s| s.scene().is_empty()));
	assert_eq!(host.fetched.borrow().len(), 1);
}
