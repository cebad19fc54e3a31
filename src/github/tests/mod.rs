//! Unit tests for repository addressing and token handling.
