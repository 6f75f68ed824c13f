pub mod sstv;
