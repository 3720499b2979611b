//! Audio-thread half of the signal graph.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer};

use crate::graph::{
    command::{GraphCommand, NodeSlot, Retired},
    node::{NodeKind, MAX_INPUTS},
    port::{NodeHandle, PortRef},
};

/*
Block Rendering
===============

Each block runs in four steps:

  1. drain the command ring (new nodes, wires, parameter ramps, retirements)
  2. drop nodes whose retirement is due, sending them back to the control side
  3. re-sort the nodes if the wiring changed
  4. run every node once, in order

Ordering is a topological sort (Kahn). Input ports sum every wire that lands
on them, reading the source's output buffer. A source that has already run
this block contributes its fresh samples; one that has not (because it sits
in a feedback loop) contributes what it rendered last block. Feedback paths
therefore carry exactly one block of latency instead of stalling the sort.

Nothing here allocates once the renderer is built. Node, wire, retirement
and sort storage is sized up front from the layout, and the controller
refuses work that would outgrow it.
*/

/// One oscilloscope sample pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScopeFrame {
    pub y: f32,
    pub x: f32,
}

pub struct GraphRenderer {
    sample_rate: f32,
    block_size: usize,
    commands: Consumer<GraphCommand>,
    retired: Producer<Retired>,
    scope: Producer<ScopeFrame>,
    ready: Arc<AtomicBool>,
    nodes: Vec<Option<Box<NodeSlot>>>,
    edges: Vec<(PortRef, PortRef)>,
    retiring: Vec<(NodeHandle, u64)>,
    order: Vec<usize>,
    order_dirty: bool,
    indegree: Vec<usize>,
    queue: Vec<usize>,
    inputs: Vec<Vec<f32>>,
    input_amplifiers: Vec<NodeHandle>,
    output_buses: Vec<NodeHandle>,
    frame: u64,
    last_frames: usize,
}

impl GraphRenderer {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        sample_rate: f32,
        block_size: usize,
        capacity: (usize, usize),
        commands: Consumer<GraphCommand>,
        retired: Producer<Retired>,
        scope: Producer<ScopeFrame>,
        ready: Arc<AtomicBool>,
        fixed: Vec<(NodeHandle, Box<NodeSlot>)>,
        input_amplifiers: Vec<NodeHandle>,
        output_buses: Vec<NodeHandle>,
    ) -> Self {
        let (max_nodes, max_edges) = capacity;
        let mut nodes = Vec::with_capacity(max_nodes);
        nodes.resize_with(max_nodes, || None);
        let mut renderer = Self {
            sample_rate,
            block_size,
            commands,
            retired,
            scope,
            ready,
            nodes,
            edges: Vec::with_capacity(max_edges),
            retiring: Vec::with_capacity(max_nodes),
            order: Vec::with_capacity(max_nodes),
            order_dirty: true,
            indegree: Vec::with_capacity(max_nodes),
            queue: Vec::with_capacity(max_nodes),
            inputs: vec![vec![0.0; block_size]; MAX_INPUTS],
            input_amplifiers,
            output_buses,
            frame: 0,
            last_frames: 0,
        };
        for (handle, slot) in fixed {
            renderer.insert(handle, slot);
        }
        renderer
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Samples rendered since the graph was built.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of nodes currently alive on the audio side.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Node slots and wires reserved up front.
    pub fn capacity(&self) -> (usize, usize) {
        (self.nodes.len(), self.edges.capacity())
    }

    /// Feed the next block of an input amplifier. Cleared after each block.
    pub fn set_input(&mut self, channel: usize, samples: &[f32]) {
        let Some(&handle) = self.input_amplifiers.get(channel) else {
            return;
        };
        if let Some(Some(slot)) = self.nodes.get_mut(handle.0 as usize) {
            let out = &mut slot.outputs[0];
            let n = samples.len().min(out.len());
            out[..n].copy_from_slice(&samples[..n]);
        }
    }

    /// Last block rendered by an output bus.
    pub fn bus_output(&self, bus: usize) -> &[f32] {
        self.output_buses
            .get(bus)
            .and_then(|handle| self.nodes.get(handle.0 as usize))
            .and_then(|slot| slot.as_ref())
            .map(|slot| &slot.outputs[0][..self.last_frames])
            .unwrap_or(&[])
    }

    /// Render one block of at most `block_size` frames. Returns the number of
    /// frames actually rendered.
    pub fn render_block(&mut self, frames: usize) -> usize {
        let frames = frames.min(self.block_size);
        if !self.ready.load(Ordering::Relaxed) {
            self.ready.store(true, Ordering::Release);
        }

        self.drain_commands();
        self.retire_due();
        if self.order_dirty {
            self.sort();
        }

        for position in 0..self.order.len() {
            let index = self.order[position];
            let Some(mut slot) = self.nodes[index].take() else {
                continue;
            };
            let kind = slot.node.kind();

            for port in 0..kind.inputs() {
                let buffer = &mut self.inputs[port][..frames];
                buffer.fill(0.0);
                for (from, to) in &self.edges {
                    if to.node.0 as usize != index || to.port != port {
                        continue;
                    }
                    let source = if from.node.0 as usize == index {
                        Some(&slot.outputs)
                    } else {
                        self.nodes
                            .get(from.node.0 as usize)
                            .and_then(|s| s.as_ref())
                            .map(|s| &s.outputs)
                    };
                    if let Some(signal) = source.and_then(|outputs| outputs.get(from.port)) {
                        for (acc, &x) in buffer.iter_mut().zip(&signal[..frames]) {
                            *acc += x;
                        }
                    }
                }
            }

            slot.node
                .process(&self.inputs, &mut slot.outputs, frames, self.sample_rate);

            if kind == NodeKind::Oscilloscope {
                for i in 0..frames {
                    let frame = ScopeFrame {
                        y: self.inputs[0][i],
                        x: self.inputs[1][i],
                    };
                    if self.scope.push(frame).is_err() {
                        break;
                    }
                }
            }

            self.nodes[index] = Some(slot);
        }

        for handle in &self.input_amplifiers {
            if let Some(Some(slot)) = self.nodes.get_mut(handle.0 as usize) {
                slot.outputs[0].fill(0.0);
            }
        }

        self.frame += frames as u64;
        self.last_frames = frames;
        frames
    }

    fn insert(&mut self, handle: NodeHandle, slot: Box<NodeSlot>) {
        match self.nodes.get_mut(handle.0 as usize) {
            Some(entry) => {
                *entry = Some(slot);
                self.order_dirty = true;
            }
            // Out of range: hand it straight back to be freed
            None => {
                let _ = self.retired.push(Retired { handle, slot });
            }
        }
    }


    fn exists(&self, handle: NodeHandle) -> bool {
        matches!(self.nodes.get(handle.0 as usize), Some(Some(_)))
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                GraphCommand::AddNode { handle, slot } => self.insert(handle, slot),
                GraphCommand::Connect { from, to } => {
                    if self.exists(from.node)
                        && self.exists(to.node)
                        && self.edges.len() < self.edges.capacity()
                        && !self.edges.contains(&(from, to))
                    {
                        self.edges.push((from, to));
                        self.order_dirty = true;
                    }
                }
                GraphCommand::Disconnect { from, to } => {
                    if let Some(position) = self.edges.iter().position(|e| *e == (from, to)) {
                        self.edges.swap_remove(position);
                        self.order_dirty = true;
                    }
                }
                GraphCommand::SetParam {
                    node,
                    param,
                    value,
                    ramp_samples,
                } => {
                    if let Some(Some(slot)) = self.nodes.get_mut(node.0 as usize) {
                        slot.node.set_param(param, value, ramp_samples);
                    }
                }
                GraphCommand::Retire {
                    node,
                    after_samples,
                } => {
                    if self.retiring.len() < self.retiring.capacity() {
                        self.retiring.push((node, self.frame + after_samples as u64));
                    }
                }
            }
        }
    }

    fn retire_due(&mut self) {
        let mut i = 0;
        while i < self.retiring.len() {
            let (handle, due) = self.retiring[i];
            if due > self.frame {
                i += 1;
                continue;
            }
            self.retiring.swap_remove(i);

            self.edges
                .retain(|(from, to)| from.node != handle && to.node != handle);
            if let Some(slot) = self.nodes.get_mut(handle.0 as usize).and_then(Option::take) {
                // The return ring has a place for every handle, so this fits
                let _ = self.retired.push(Retired { handle, slot });
            }
            self.order_dirty = true;
        }
    }

    fn sort(&mut self) {
        let count = self.nodes.len();
        self.indegree.clear();
        self.indegree.resize(count, 0);
        self.order.clear();
        self.queue.clear();

        for (from, to) in &self.edges {
            if from.node != to.node {
                self.indegree[to.node.0 as usize] += 1;
            }
        }
        for index in 0..count {
            if self.nodes[index].is_some() && self.indegree[index] == 0 {
                self.queue.push(index);
            }
        }

        let mut head = 0;
        while head < self.queue.len() {
            let index = self.queue[head];
            head += 1;
            self.order.push(index);
            for (from, to) in &self.edges {
                if from.node.0 as usize == index && from.node != to.node {
                    let target = to.node.0 as usize;
                    self.indegree[target] -= 1;
                    if self.indegree[target] == 0 {
                        self.queue.push(target);
                    }
                }
            }
        }

        // Whatever is left sits on a feedback loop.
        for index in 0..count {
            if self.nodes[index].is_some() && self.indegree[index] > 0 {
                self.order.push(index);
            }
        }

        self.order_dirty = false;
    }
}
