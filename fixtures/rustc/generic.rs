//! Generic list, instantiated once per active `--cfg` tag.

use std::hint::black_box;

pub struct List<T> {
    items: Vec<T>,
}

impl<T> List<T> {
    pub fn new() -> Self {
        List { items: Vec::new() }
    }

    pub fn add(&mut self, value: T) {
        self.items.push(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

macro_rules! fill {
    ($name:ident, $t:ty) => {
        pub fn $name(n: usize) -> List<$t> {
            let mut list = List::new();
            for i in 0..n {
                list.add(i as $t);
            }
            list
        }
    };
}

#[cfg(int)]
fill!(fill_int, isize);
#[cfg(int8)]
fill!(fill_int8, i8);
#[cfg(int16)]
fill!(fill_int16, i16);
#[cfg(int32)]
fill!(fill_int32, i32);
#[cfg(int64)]
fill!(fill_int64, i64);

#[allow(dead_code)]
fn main() {
    #[allow(unused_mut)]
    let mut total = 0usize;
    #[cfg(int)]
    {
        total += fill_int(black_box(1000)).len();
    }
    #[cfg(int8)]
    {
        total += fill_int8(black_box(1000)).len();
    }
    #[cfg(int16)]
    {
        total += fill_int16(black_box(1000)).len();
    }
    #[cfg(int32)]
    {
        total += fill_int32(black_box(1000)).len();
    }
    #[cfg(int64)]
    {
        total += fill_int64(black_box(1000)).len();
    }
    println!("{}", black_box(total));
}
