//! Boxed list: one element representation for every type, so `--cfg` flags
//! change nothing.

use std::any::Any;
use std::hint::black_box;

pub struct BoxedList {
    items: Vec<Box<dyn Any>>,
}

impl BoxedList {
    pub fn new() -> Self {
        BoxedList { items: Vec::new() }
    }

    pub fn add(&mut self, value: Box<dyn Any>) {
        self.items.push(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

pub fn fill(n: usize) -> BoxedList {
    let mut list = BoxedList::new();
    for i in 0..n {
        list.add(Box::new(i as isize));
    }
    list
}

#[allow(dead_code)]
fn main() {
    let list = fill(black_box(1000));
    println!("{}", list.len());
}
