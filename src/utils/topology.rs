/// Describes how neighbour lookup behaves at the edges of the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Bounds of the field are stitched together; neighbour coordinates
    /// wrap modulo width/height.
    Torus,
    /// Any neighbour position outside the field counts as permanently dead.
    Bounded,
}
