//! Test utilities: an in-memory host and a loopback transport.
//!
//! Requires feature: `test-utils`
//!
//! [`SimulatedHost`] speaks the same JSON protocol as the real host: it keeps
//! a node tree, components and members, acknowledges `addSlot` without
//! returning the new id, and allocates collection elements without honouring
//! the target of an id-less element (the slot must be filled by a second
//! update naming the element id). It can be driven through
//! [`LoopbackTransport`] or served over a real WebSocket by a test harness.

use crate::domain::LinkError;
use crate::ports::{InboundHandler, LinkTransport};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use shared_types::{Envelope, Float3, Member, OperationTag, RemoteComponent, Reply, ROOT_NODE_ID};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

struct NodeRecord {
    id: String,
    name: String,
    position: Option<Float3>,
    active: bool,
    children: Vec<String>,
    components: Vec<String>,
}

struct ComponentRecord {
    id: String,
    component_type: String,
    members: BTreeMap<String, Member>,
}

impl ComponentRecord {
    fn snapshot(&self) -> RemoteComponent {
        RemoteComponent {
            id: self.id.clone(),
            component_type: self.component_type.clone(),
            members: self.members.clone(),
        }
    }
}

#[derive(Default)]
struct HostState {
    next_id: u64,
    nodes: HashMap<String, NodeRecord>,
    components: HashMap<String, ComponentRecord>,
    received: Vec<Envelope>,
    asset_urls: VecDeque<String>,
    imports: Vec<(String, String)>,
    reject_imports: bool,
    rejected_types: Vec<String>,
    silent: bool,
}

impl HostState {
    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn insert_node(&mut self, parent_id: &str, name: &str, position: Option<Float3>, active: bool) -> Option<String> {
        if !self.nodes.contains_key(parent_id) {
            return None;
        }
        let id = self.allocate("S");
        self.nodes.insert(
            id.clone(),
            NodeRecord {
                id: id.clone(),
                name: name.to_string(),
                position,
                active,
                children: Vec::new(),
                components: Vec::new(),
            },
        );
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.push(id.clone());
        }
        Some(id)
    }

    fn node_json(&self, id: &str, depth: u64, include_components: bool) -> Value {
        let Some(node) = self.nodes.get(id) else {
            return Value::Null;
        };
        let children: Vec<Value> = if depth > 0 {
            node.children
                .iter()
                .map(|child| self.node_json(child, depth - 1, include_components))
                .collect()
        } else {
            Vec::new()
        };

        let mut value = json!({
            "id": node.id,
            "name": { "$type": "string", "value": node.name },
            "isActive": { "$type": "bool", "value": node.active },
            "children": children,
        });
        if let Some(p) = node.position {
            value["position"] = json!({ "$type": "float3", "value": { "x": p.x, "y": p.y, "z": p.z } });
        }
        if include_components {
            let components: Vec<Value> = node
                .components
                .iter()
                .filter_map(|c| self.components.get(c))
                .map(|c| serde_json::to_value(c.snapshot()).unwrap_or(Value::Null))
                .collect();
            value["components"] = Value::Array(components);
        }
        value
    }

    fn template_members(&mut self, component_type: &str) -> BTreeMap<String, Member> {
        let mut members = BTreeMap::new();
        let mut field = |state: &mut HostState, name: &str, type_tag: &str, value: Value| {
            let id = state.allocate("M");
            members.insert(
                name.to_string(),
                Member::Field {
                    id: Some(id),
                    type_tag: type_tag.to_string(),
                    value,
                },
            );
        };

        if component_type.contains("StaticTexture2D") {
            field(self, "URL", "Uri", Value::Null);
        } else if component_type.contains("QuadMesh") {
            field(self, "Size", "float2", json!({ "x": 1.0, "y": 1.0 }));
        } else if component_type.contains("BoxCollider") {
            field(self, "Size", "float3", json!({ "x": 1.0, "y": 1.0, "z": 0.0 }));
            field(self, "Type", "enum", json!("Static"));
        } else if component_type.contains("MeshRenderer") {
            let mesh_id = self.allocate("M");
            let list_id = self.allocate("M");
            members.insert(
                "Mesh".to_string(),
                Member::Reference {
                    id: Some(mesh_id),
                    target_id: None,
                },
            );
            members.insert(
                "Materials".to_string(),
                Member::Collection {
                    id: Some(list_id),
                    elements: Vec::new(),
                },
            );
        }
        members
    }

    fn apply_member(&mut self, component_id: &str, name: &str, update: Member) -> Result<(), String> {
        let fresh = self.allocate("M");
        let component = self
            .components
            .get_mut(component_id)
            .ok_or_else(|| format!("Component {component_id} not found"))?;
        let current = component.members.remove(name);

        let next = match (current, update) {
            (Some(Member::Collection { id, mut elements }), Member::Collection { elements: updates, .. }) => {
                let mut counter = 0;
                for element in updates {
                    match element.id() {
                        Some(element_id) => {
                            let slot = elements
                                .iter_mut()
                                .find(|e| e.id() == Some(element_id))
                                .ok_or_else(|| format!("Element {element_id} not found"))?;
                            *slot = Member::Reference {
                                id: Some(element_id.to_string()),
                                target_id: element.target_id().map(str::to_string),
                            };
                        }
                        None => {
                            counter += 1;
                            elements.push(Member::Reference {
                                id: Some(format!("{fresh}.{counter}")),
                                target_id: None,
                            });
                        }
                    }
                }
                Member::Collection { id, elements }
            }
            (current, Member::Collection { elements: updates, .. }) => {
                if updates.iter().any(|e| e.id().is_some()) {
                    return Err("Element not found".to_string());
                }
                let id = current.and_then(|m| m.id().map(str::to_string)).or(Some(fresh.clone()));
                Member::Collection {
                    id,
                    elements: (1..=updates.len())
                        .map(|n| Member::Reference {
                            id: Some(format!("{fresh}.{n}")),
                            target_id: None,
                        })
                        .collect(),
                }
            }
            (current, Member::Reference { target_id, .. }) => Member::Reference {
                id: current.and_then(|m| m.id().map(str::to_string)).or(Some(fresh)),
                target_id,
            },
            (current, Member::Field { type_tag, value, .. }) => Member::Field {
                id: current.and_then(|m| m.id().map(str::to_string)).or(Some(fresh)),
                type_tag,
                value,
            },
        };

        if let Some(component) = self.components.get_mut(component_id) {
            component.members.insert(name.to_string(), next);
        }
        Ok(())
    }
}

fn str_field<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// In-memory stand-in for the remote host.
pub struct SimulatedHost {
    state: Mutex<HostState>,
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHost {
    /// Host with an empty scene under a node named `Root`.
    pub fn new() -> Self {
        let mut state = HostState::default();
        state.nodes.insert(
            ROOT_NODE_ID.to_string(),
            NodeRecord {
                id: ROOT_NODE_ID.to_string(),
                name: ROOT_NODE_ID.to_string(),
                position: None,
                active: true,
                children: Vec::new(),
                components: Vec::new(),
            },
        );
        Self {
            state: Mutex::new(state),
        }
    }

    /// Handle one inbound text frame. `None` means the host stays silent.
    pub fn handle_text(&self, text: &str) -> Option<String> {
        let envelope = Envelope::parse(text).ok()?;
        self.handle(envelope).and_then(|reply| reply.to_text().ok())
    }

    /// Handle one envelope and produce its reply.
    pub fn handle(&self, envelope: Envelope) -> Option<Reply> {
        let mut state = self.state.lock();
        state.received.push(envelope.clone());
        if state.silent {
            return None;
        }

        let id = envelope.message_id.clone();
        let payload = Value::Object(envelope.payload);
        let reply = match envelope.operation {
            OperationTag::ImportTexture => {
                let path = str_field(&payload, "/filePath").unwrap_or_default().to_string();
                if state.reject_imports || path.is_empty() {
                    Reply::failed(id, format!("Failed to import {path}"))
                } else {
                    let url = match state.asset_urls.pop_front() {
                        Some(url) => url,
                        None => format!("res://{}", state.allocate("asset-")),
                    };
                    state.imports.push((url.clone(), path));
                    Reply::ok(id).with_kind("assetData").with_asset_url(url)
                }
            }
            OperationTag::AddNode => {
                let parent = str_field(&payload, "/data/parent/targetId").unwrap_or(ROOT_NODE_ID);
                let name = str_field(&payload, "/data/name/value");
                let position = payload
                    .pointer("/data/position/value")
                    .and_then(|v| serde_json::from_value(v.clone()).ok());
                let active = payload
                    .pointer("/data/isActive/value")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                match name {
                    Some(name) => match state.insert_node(parent, name, position, active) {
                        Some(_) => Reply::ok(id),
                        None => Reply::failed(id, format!("Parent slot {parent} not found")),
                    },
                    None => Reply::failed(id, "Missing slot name"),
                }
            }
            OperationTag::GetNode => {
                let node_id = str_field(&payload, "/slotId").unwrap_or_default();
                let depth = payload.pointer("/depth").and_then(Value::as_u64).unwrap_or(0);
                let include = payload
                    .pointer("/includeComponentData")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if state.nodes.contains_key(node_id) {
                    let data = state.node_json(node_id, depth, include);
                    Reply::ok(id).with_kind("slotData").with_data(data)
                } else {
                    Reply::failed(id, format!("Slot {node_id} not found"))
                }
            }
            OperationTag::AddComponent => {
                let node_id = str_field(&payload, "/containerSlotId").unwrap_or_default().to_string();
                let component_type = str_field(&payload, "/data/componentType")
                    .unwrap_or_default()
                    .to_string();
                if !state.nodes.contains_key(&node_id) {
                    Reply::failed(id, format!("Slot {node_id} not found"))
                } else if component_type.is_empty()
                    || state.rejected_types.iter().any(|t| component_type.contains(t.as_str()))
                {
                    Reply::failed(id, format!("Unknown component type {component_type}"))
                } else {
                    let component_id = state.allocate("C");
                    let members = state.template_members(&component_type);
                    state.components.insert(
                        component_id.clone(),
                        ComponentRecord {
                            id: component_id.clone(),
                            component_type,
                            members,
                        },
                    );
                    if let Some(node) = state.nodes.get_mut(&node_id) {
                        node.components.push(component_id);
                    }
                    Reply::ok(id)
                }
            }
            OperationTag::GetComponent => {
                let component_id = str_field(&payload, "/componentId").unwrap_or_default();
                match state.components.get(component_id) {
                    Some(component) => Reply::ok(id)
                        .with_kind("componentData")
                        .with_data(serde_json::to_value(component.snapshot()).unwrap_or(Value::Null)),
                    None => Reply::failed(id, format!("Component {component_id} not found")),
                }
            }
            OperationTag::UpdateComponent => {
                let component_id = str_field(&payload, "/data/id").unwrap_or_default().to_string();
                let members: BTreeMap<String, Member> = payload
                    .pointer("/data/members")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                if !state.components.contains_key(&component_id) {
                    Reply::failed(id, format!("Component {component_id} not found"))
                } else {
                    let outcome = members
                        .into_iter()
                        .try_for_each(|(name, member)| state.apply_member(&component_id, &name, member));
                    match outcome {
                        Ok(()) => Reply::ok(id),
                        Err(detail) => Reply::failed(id, detail),
                    }
                }
            }
        };
        Some(reply)
    }

    /// Every envelope received so far, in arrival order.
    pub fn received(&self) -> Vec<Envelope> {
        self.state.lock().received.clone()
    }

    /// Operation tags received so far, in arrival order.
    pub fn operations(&self) -> Vec<OperationTag> {
        self.state.lock().received.iter().map(|e| e.operation).collect()
    }

    pub fn clear_received(&self) {
        self.state.lock().received.clear();
    }

    /// Asset locator to hand out for the next import.
    pub fn queue_asset_url(&self, url: impl Into<String>) {
        self.state.lock().asset_urls.push_back(url.into());
    }

    pub fn set_reject_imports(&self, reject: bool) {
        self.state.lock().reject_imports = reject;
    }

    /// Fail `addComponent` for any type containing `fragment`.
    pub fn reject_component_type(&self, fragment: impl Into<String>) {
        self.state.lock().rejected_types.push(fragment.into());
    }

    /// Record calls but never reply.
    pub fn set_silent(&self, silent: bool) {
        self.state.lock().silent = silent;
    }

    /// Create a node directly, as another client would.
    pub fn seed_node(&self, parent_id: &str, name: &str) -> Option<String> {
        self.state.lock().insert_node(parent_id, name, None, true)
    }

    /// Attach a component directly, as another client would.
    pub fn seed_component(&self, node_id: &str, component_type: &str) -> Option<String> {
        let mut state = self.state.lock();
        if !state.nodes.contains_key(node_id) {
            return None;
        }
        let component_id = state.allocate("C");
        let members = state.template_members(component_type);
        state.components.insert(
            component_id.clone(),
            ComponentRecord {
                id: component_id.clone(),
                component_type: component_type.to_string(),
                members,
            },
        );
        if let Some(node) = state.nodes.get_mut(node_id) {
            node.components.push(component_id.clone());
        }
        Some(component_id)
    }

    /// Ids of every node with this name, in creation order.
    pub fn nodes_named(&self, name: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut ids: Vec<&NodeRecord> = state.nodes.values().filter(|n| n.name == name).collect();
        ids.sort_by_key(|n| n.id[1..].parse::<u64>().unwrap_or(0));
        ids.into_iter().map(|n| n.id.clone()).collect()
    }

    pub fn node_position(&self, node_id: &str) -> Option<Float3> {
        self.state.lock().nodes.get(node_id).and_then(|n| n.position)
    }

    /// Components of a node, in attachment order, with members.
    pub fn node_components(&self, node_id: &str) -> Vec<RemoteComponent> {
        let state = self.state.lock();
        state
            .nodes
            .get(node_id)
            .map(|node| {
                node.components
                    .iter()
                    .filter_map(|c| state.components.get(c))
                    .map(ComponentRecord::snapshot)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First component of a node whose type contains `fragment`.
    pub fn find_component(&self, node_id: &str, fragment: &str) -> Option<RemoteComponent> {
        self.node_components(node_id)
            .into_iter()
            .find(|c| c.component_type.contains(fragment))
    }

    pub fn component(&self, component_id: &str) -> Option<RemoteComponent> {
        self.state.lock().components.get(component_id).map(ComponentRecord::snapshot)
    }

    /// File path that produced an asset locator.
    pub fn imported_path(&self, asset_url: &str) -> Option<String> {
        self.state
            .lock()
            .imports
            .iter()
            .find(|(url, _)| url == asset_url)
            .map(|(_, path)| path.clone())
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().nodes.len()
    }
}

/// Transport that hands frames straight to a [`SimulatedHost`].
pub struct LoopbackTransport {
    host: Arc<SimulatedHost>,
    handler: RwLock<Option<Arc<dyn InboundHandler>>>,
    connected: AtomicBool,
    fail_sends: AtomicBool,
    hold_replies: AtomicBool,
    held: Mutex<Vec<String>>,
    sent: AtomicUsize,
}

impl LoopbackTransport {
    pub fn new(host: Arc<SimulatedHost>) -> Self {
        Self {
            host,
            handler: RwLock::new(None),
            connected: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            hold_replies: AtomicBool::new(false),
            held: Mutex::new(Vec::new()),
            sent: AtomicUsize::new(0),
        }
    }

    pub fn host(&self) -> &Arc<SimulatedHost> {
        &self.host
    }

    /// Push an arbitrary inbound frame to the registered handler.
    pub fn deliver(&self, text: &str) {
        let handler = self.handler.read().clone();
        if let Some(handler) = handler {
            handler.on_message(text);
        }
    }

    /// Make every send fail with a transport error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Hold replies until [`flush_held`](Self::flush_held), which releases
    /// them newest first.
    pub fn reverse_replies(&self, hold: bool) {
        self.hold_replies.store(hold, Ordering::SeqCst);
    }

    pub fn flush_held(&self) {
        let held = std::mem::take(&mut *self.held.lock());
        for text in held.iter().rev() {
            self.deliver(text);
        }
    }

    /// Simulate the remote end going away.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let handler = self.handler.read().clone();
        if let Some(handler) = handler {
            handler.on_closed();
        }
    }

    pub fn frames_sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkTransport for LoopbackTransport {
    async fn connect(&self) -> Result<(), LinkError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LinkError::Transport("simulated send failure".into()));
        }
        self.sent.fetch_add(1, Ordering::SeqCst);

        if let Some(reply) = self.host.handle_text(&text) {
            if self.hold_replies.load(Ordering::SeqCst) {
                self.held.lock().push(reply);
            } else {
                self.deliver(&reply);
            }
        }
        Ok(())
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_handler(&self, handler: Arc<dyn InboundHandler>) {
        *self.handler.write() = Some(handler);
    }
}
