use crate::graph::{
    node::RtNode,
    port::{NodeHandle, Param, PortRef},
};

/// A node plus the output buffers it renders into.
///
/// Allocated on the control thread so the renderer never has to.
pub struct NodeSlot {
    pub node: RtNode,
    pub outputs: Vec<Vec<f32>>,
}

impl NodeSlot {
    pub fn new(node: RtNode, block_size: usize) -> Self {
        let outputs = vec![vec![0.0; block_size]; node.kind().outputs()];
        Self { node, outputs }
    }
}

/// Control → audio thread messages.
pub enum GraphCommand {
    AddNode {
        handle: NodeHandle,
        slot: Box<NodeSlot>,
    },
    Connect {
        from: PortRef,
        to: PortRef,
    },
    Disconnect {
        from: PortRef,
        to: PortRef,
    },
    SetParam {
        node: NodeHandle,
        param: Param,
        value: f32,
        ramp_samples: u32,
    },
    /// Remove the node and its wires once `after_samples` have been rendered.
    Retire {
        node: NodeHandle,
        after_samples: u32,
    },
}

/// A node the renderer has let go of, sent back so it is freed off the
/// audio thread and its handle can be reused.
pub struct Retired {
    pub handle: NodeHandle,
    pub slot: Box<NodeSlot>,
}
