//! Control-thread half of the signal graph.
//!
//! [`SignalGraph::build`] splits a graph into a [`GraphController`], which
//! implements [`AudioGraph`] and lives with the patch bay, and a
//! [`GraphRenderer`], which is moved into the audio callback. The two only
//! talk through lock-free `rtrb` rings.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info};

use crate::{
    blueprint::ScopeAxis,
    dsp::smooth::ramp_samples,
    error::GraphError,
    graph::{
        command::{GraphCommand, NodeSlot, Retired},
        node::{NodeKind, OutputBusNode, RtNode},
        port::{
            AudioGraph, NodeHandle, NoiseParams, OscillatorParams, Param, PortRef, SlewParams,
            BUS_AUDIO_INPUT, BUS_LEVEL_CV_INPUT, BUS_VOLTAGE_INPUT,
        },
        render::{GraphRenderer, ScopeFrame},
    },
    MAX_BLOCK_SIZE,
};

/// Sizes of the fixed part of the graph and of the rings between threads.
///
/// `max_nodes` and `max_edges` bound what the renderer reserves up front;
/// the controller refuses anything past them with [`GraphError::AtCapacity`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphLayout {
    pub input_amplifiers: usize,
    pub output_buses: usize,
    pub block_size: usize,
    pub command_capacity: usize,
    pub scope_capacity: usize,
    pub max_nodes: usize,
    pub max_edges: usize,
}

impl Default for GraphLayout {
    fn default() -> Self {
        Self {
            input_amplifiers: crate::blueprint::panels::INPUT_AMPLIFIERS,
            output_buses: crate::blueprint::panels::OUTPUT_BUSES,
            block_size: MAX_BLOCK_SIZE,
            command_capacity: 4096,
            scope_capacity: 8192,
            max_nodes: 4096,
            max_edges: 8192,
        }
    }
}

pub struct SignalGraph;

impl SignalGraph {
    /// Build the fixed panel (input amplifiers, output buses, oscilloscope)
    /// and split the graph between threads.
    pub fn build(
        layout: GraphLayout,
        sample_rate: f32,
    ) -> (GraphController, GraphRenderer, Consumer<ScopeFrame>) {
        let fixed_nodes = layout.input_amplifiers + layout.output_buses + 1;
        let max_nodes = layout.max_nodes.max(fixed_nodes);
        let (command_tx, command_rx) = RingBuffer::new(layout.command_capacity);
        // One place per handle, so a retiring node always has a way back
        let (retired_tx, retired_rx) = RingBuffer::new(max_nodes);
        let (scope_tx, scope_rx) = RingBuffer::new(layout.scope_capacity);
        let ready = Arc::new(AtomicBool::new(false));

        let mut nodes = BTreeMap::new();
        let mut fixed = Vec::new();
        let mut next = 0u32;
        let mut add = |node: RtNode| {
            let handle = NodeHandle(next);
            next += 1;
            nodes.insert(handle, node.kind());
            fixed.push((handle, Box::new(NodeSlot::new(node, layout.block_size))));
            handle
        };

        let input_amplifiers: Vec<NodeHandle> = (0..layout.input_amplifiers)
            .map(|_| add(RtNode::InputAmplifier))
            .collect();
        let output_buses: Vec<NodeHandle> = (0..layout.output_buses)
            .map(|_| add(RtNode::OutputBus(OutputBusNode::new())))
            .collect();
        let oscilloscope = add(RtNode::Oscilloscope);

        let renderer = GraphRenderer::new(
            sample_rate,
            layout.block_size,
            (max_nodes, layout.max_edges),
            command_rx,
            retired_tx,
            scope_tx,
            ready.clone(),
            fixed,
            input_amplifiers.clone(),
            output_buses.clone(),
        );

        let fixed_count = nodes.len();
        let controller = GraphController {
            sample_rate,
            block_size: layout.block_size,
            commands: command_tx,
            retired: retired_rx,
            ready,
            next_handle: next,
            fixed_count,
            max_nodes,
            max_edges: layout.max_edges,
            free: Vec::new(),
            lingering: HashMap::new(),
            lingering_edges: 0,
            nodes,
            edges: BTreeSet::new(),
            params: HashMap::new(),
            input_amplifiers,
            output_buses,
            oscilloscope,
        };

        (controller, renderer, scope_rx)
    }
}

pub struct GraphController {
    sample_rate: f32,
    block_size: usize,
    commands: Producer<GraphCommand>,
    retired: Consumer<Retired>,
    ready: Arc<AtomicBool>,
    next_handle: u32,
    fixed_count: usize,
    max_nodes: usize,
    max_edges: usize,
    free: Vec<NodeHandle>,
    /// Wires of released nodes the renderer still holds, per node.
    lingering: HashMap<NodeHandle, usize>,
    lingering_edges: usize,
    nodes: BTreeMap<NodeHandle, NodeKind>,
    edges: BTreeSet<(PortRef, PortRef)>,
    params: HashMap<(NodeHandle, Param), f32>,
    input_amplifiers: Vec<NodeHandle>,
    output_buses: Vec<NodeHandle>,
    oscilloscope: NodeHandle,
}

impl GraphController {
    /// Treat the graph as running without an audio callback (offline
    /// rendering and tests).
    pub fn mark_ready(&self) {
        if !self.ready.swap(true, Ordering::AcqRel) {
            info!("signal graph marked ready");
        }
    }

    pub fn node_kind(&self, node: NodeHandle) -> Option<NodeKind> {
        self.nodes.get(&node).copied()
    }

    /// Nodes created through the port that have not been released.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.fixed_count
    }

    pub fn count_of(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|&&k| k == kind).count()
    }

    pub fn is_connected(&self, from: PortRef, to: PortRef) -> bool {
        self.edges.contains(&(from, to))
    }

    /// Wires landing on `to`.
    pub fn sources_of(&self, to: PortRef) -> Vec<PortRef> {
        self.edges
            .iter()
            .filter(|(_, t)| *t == to)
            .map(|(f, _)| *f)
            .collect()
    }

    /// Last value requested for a parameter.
    pub fn param_target(&self, node: NodeHandle, param: Param) -> Option<f32> {
        self.params.get(&(node, param)).copied()
    }

    /// Take back handles of nodes the renderer has dropped.
    fn reclaim(&mut self) {
        while let Ok(retired) = self.retired.pop() {
            if let Some(wires) = self.lingering.remove(&retired.handle) {
                self.lingering_edges -= wires;
            }
            self.free.push(retired.handle);
        }
    }

    fn send(&mut self, command: GraphCommand) -> Result<(), GraphError> {
        self.commands
            .push(command)
            .map_err(|_| GraphError::QueueFull)
    }

    fn create(&mut self, node: RtNode) -> Result<NodeHandle, GraphError> {
        if !self.is_ready() {
            return Err(GraphError::NotReady);
        }
        self.reclaim();

        let kind = node.kind();
        let handle = match self.free.pop() {
            Some(handle) => handle,
            None => {
                if self.next_handle as usize >= self.max_nodes {
                    return Err(GraphError::AtCapacity);
                }
                let handle = NodeHandle(self.next_handle);
                self.next_handle += 1;
                handle
            }
        };
        let slot = Box::new(NodeSlot::new(node, self.block_size));
        if let Err(err) = self.send(GraphCommand::AddNode { handle, slot }) {
            self.free.push(handle);
            return Err(err);
        }
        self.nodes.insert(handle, kind);
        Ok(handle)
    }

    fn check_output(&self, port: PortRef) -> Result<(), GraphError> {
        let kind = self
            .node_kind(port.node)
            .ok_or(GraphError::UnknownNode(port.node))?;
        if port.port >= kind.outputs() {
            return Err(GraphError::InvalidPort(port));
        }
        Ok(())
    }

    fn check_input(&self, port: PortRef) -> Result<(), GraphError> {
        let kind = self
            .node_kind(port.node)
            .ok_or(GraphError::UnknownNode(port.node))?;
        if port.port >= kind.inputs() {
            return Err(GraphError::InvalidPort(port));
        }
        Ok(())
    }

    fn bus_port(&self, bus: usize, port: usize) -> Option<PortRef> {
        self.output_buses
            .get(bus)
            .map(|&node| PortRef::new(node, port))
    }
}

impl AudioGraph for GraphController {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn create_oscillator_voice(
        &mut self,
        params: &OscillatorParams,
    ) -> Result<NodeHandle, GraphError> {
        self.create(RtNode::oscillator(params))
    }

    fn create_noise_voice(&mut self, params: &NoiseParams) -> Result<NodeHandle, GraphError> {
        self.create(RtNode::noise(params))
    }

    fn create_filter_stage(&mut self, cutoff_hz: f32) -> Result<NodeHandle, GraphError> {
        self.create(RtNode::filter(cutoff_hz))
    }

    fn create_gain_stage(&mut self, gain: f32) -> Result<NodeHandle, GraphError> {
        self.create(RtNode::gain(gain))
    }

    fn create_slew_stage(&mut self, params: &SlewParams) -> Result<NodeHandle, GraphError> {
        self.create(RtNode::slew(params, self.sample_rate))
    }

    fn create_clip_stage(&mut self, knee: f32, limit: f32) -> Result<NodeHandle, GraphError> {
        self.create(RtNode::clip(knee, limit))
    }

    fn input_amplifier_output(&self, channel: usize) -> Option<PortRef> {
        self.input_amplifiers
            .get(channel)
            .map(|&node| PortRef::new(node, 0))
    }

    fn output_bus_output(&self, bus: usize) -> Option<PortRef> {
        self.bus_port(bus, 0)
    }

    fn output_bus_input(&self, bus: usize) -> Option<PortRef> {
        self.bus_port(bus, BUS_AUDIO_INPUT)
    }

    fn output_voltage_input(&self, bus: usize) -> Option<PortRef> {
        self.bus_port(bus, BUS_VOLTAGE_INPUT)
    }

    fn oscilloscope_input(&self, axis: ScopeAxis) -> Option<PortRef> {
        let port = match axis {
            ScopeAxis::Y => 0,
            ScopeAxis::X => 1,
        };
        Some(PortRef::new(self.oscilloscope, port))
    }

    fn connect_output_level_cv(&mut self, bus: usize, from: PortRef) -> bool {
        let Some(to) = self.bus_port(bus, BUS_LEVEL_CV_INPUT) else {
            return false;
        };
        match self.connect(from, to) {
            Ok(()) => true,
            Err(err) => {
                debug!(bus, ?err, "level CV link failed");
                false
            }
        }
    }

    fn disconnect_output_level_cv(&mut self, bus: usize, from: PortRef) {
        if let Some(to) = self.bus_port(bus, BUS_LEVEL_CV_INPUT) {
            if let Err(err) = self.disconnect(from, to) {
                debug!(bus, ?err, "level CV unlink failed");
            }
        }
    }

    fn connect(&mut self, from: PortRef, to: PortRef) -> Result<(), GraphError> {
        self.check_output(from)?;
        self.check_input(to)?;
        if self.edges.contains(&(from, to)) {
            return Ok(());
        }
        self.reclaim();
        if self.edges.len() + self.lingering_edges >= self.max_edges {
            return Err(GraphError::AtCapacity);
        }
        self.send(GraphCommand::Connect { from, to })?;
        self.edges.insert((from, to));
        Ok(())
    }

    fn disconnect(&mut self, from: PortRef, to: PortRef) -> Result<(), GraphError> {
        if !self.edges.contains(&(from, to)) {
            return Ok(());
        }
        self.send(GraphCommand::Disconnect { from, to })?;
        self.edges.remove(&(from, to));
        Ok(())
    }

    fn set_param(
        &mut self,
        node: NodeHandle,
        param: Param,
        value: f32,
        ramp_seconds: f32,
    ) -> Result<(), GraphError> {
        let kind = self.node_kind(node).ok_or(GraphError::UnknownNode(node))?;
        if !kind.accepts(param) {
            return Err(GraphError::UnsupportedParam { node, param });
        }
        let ramp_samples = ramp_samples(ramp_seconds, self.sample_rate);
        self.send(GraphCommand::SetParam {
            node,
            param,
            value,
            ramp_samples,
        })?;
        self.params.insert((node, param), value);
        Ok(())
    }

    fn release(&mut self, node: NodeHandle, fade_seconds: f32) -> Result<(), GraphError> {
        if (node.0 as usize) < self.fixed_count {
            return Err(GraphError::FixedNode(node));
        }
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::UnknownNode(node));
        }
        let after_samples = ramp_samples(fade_seconds, self.sample_rate);
        self.send(GraphCommand::Retire {
            node,
            after_samples,
        })?;
        self.nodes.remove(&node);
        let before = self.edges.len();
        self.edges
            .retain(|(from, to)| from.node != node && to.node != node);
        let wires = before - self.edges.len();
        if wires > 0 {
            *self.lingering.entry(node).or_insert(0) += wires;
            self.lingering_edges += wires;
        }
        self.params.retain(|(n, _), _| *n != node);
        Ok(())
    }
}
