// End-to-end tests for the audio API
//
// Each test gets its own server on an ephemeral port, backed by a temporary
// audio store directory and an in-process fake speech provider.

mod helpers;
mod test_audio;
mod test_health;
