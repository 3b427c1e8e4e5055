use crate::graph::{
    amplify::Amplify,
    mix::Mix,
    modulate::Modulate,
    node::{GraphNode, Modulatable},
    through::Through,
};

pub trait NodeExt: GraphNode + Sized {
    fn amplify<M: GraphNode>(self, modulator: M) -> Amplify<Self, M> {
        Amplify::new(self, modulator)
    }

    fn through<P: GraphNode>(self, processor: P) -> Through<Self, P> {
        Through::new(self, processor)
    }

    fn modulate<M: GraphNode>(self, modulator: M, param: Self::Param, depth: f32) -> Modulate<Self, M>
    where
        Self: Modulatable,
    {
        Modulate::new(self, modulator, param, depth)
    }

    fn mix<B: GraphNode>(self, other: B, balance: f32) -> Mix<Self, B> {
        Mix::new(self, other, balance)
    }
}

impl<T: GraphNode> NodeExt for T {}
