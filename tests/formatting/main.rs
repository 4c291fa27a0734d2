mod golden;
mod roundtrip;
