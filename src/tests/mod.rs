
mod control_dispatch_tests;
