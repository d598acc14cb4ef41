use std::io::{self, BufRead, Read};

/// Reader-обёртка, считающая прочитанные байты.
///
/// Счётчик даёт offset начала каждой записи для диагностики ошибок.
#[derive(Debug)]
pub struct CountingRead<R> {
    inner: R,
    bytes_read: u64,
}

impl<R> CountingRead<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }

    /// Текущее кол-во прочитанных байт.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Обнуляет счётчик (после перемотки источника).
    pub fn reset_count(&mut self) {
        self.bytes_read = 0;
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingRead<R> {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for CountingRead<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(
        &mut self,
        amt: usize,
    ) {
        self.inner.consume(amt);
        self.bytes_read += amt as u64;
    }
}
