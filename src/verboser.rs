pub enum Message {
    CreatingPin(usize),
    Computing(usize),
    Exhausted(usize),
}

pub trait Verboser {
    fn verbose(&mut self, message: Message);
}

pub struct Silent;

impl Verboser for Silent {
    fn verbose(&mut self, _: Message) {}
}
