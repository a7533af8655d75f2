mod controller;
mod support;
