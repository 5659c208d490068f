/// Pumps are only carried through; their parameters are not interpreted
#[derive(Debug, Clone)]
pub struct Pump;
