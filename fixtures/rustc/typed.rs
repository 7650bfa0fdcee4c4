//! Hand-written list per element type, each behind its own `--cfg` tag.

use std::hint::black_box;

macro_rules! typed_list {
    ($name:ident, $fill:ident, $t:ty) => {
        pub struct $name {
            items: Vec<$t>,
        }

        impl $name {
            pub fn new() -> Self {
                $name { items: Vec::new() }
            }

            pub fn add(&mut self, value: $t) {
                self.items.push(value);
            }

            pub fn len(&self) -> usize {
                self.items.len()
            }
        }

        pub fn $fill(n: usize) -> $name {
            let mut list = $name::new();
            for i in 0..n {
                list.add(i as $t);
            }
            list
        }
    };
}

#[cfg(int)]
typed_list!(IntList, fill_int, isize);
#[cfg(int8)]
typed_list!(Int8List, fill_int8, i8);
#[cfg(int16)]
typed_list!(Int16List, fill_int16, i16);
#[cfg(int32)]
typed_list!(Int32List, fill_int32, i32);
#[cfg(int64)]
typed_list!(Int64List, fill_int64, i64);

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
